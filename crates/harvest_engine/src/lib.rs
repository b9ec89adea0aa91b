//! Harvest engine: page driving, HTTP fetching and the download pipeline.
mod dimensions;
mod download;
mod engine;
mod fetch;
mod filename;
mod harvest;
mod page;
mod persist;
mod report;
mod types;

#[cfg(feature = "dimensions")]
pub use dimensions::ImageCrateDecoder;
pub use dimensions::{DecodeError, DecoderAvailability, DimensionDecoder, ImageDimensions};
pub use download::{DownloadPipeline, DownloadSettings, MIN_BODY_BYTES};
pub use engine::{CrawlConfig, CrawlError, CrawlSummary, Crawler, StartSource, SEARCH_URL};
pub use fetch::{
    FetchSettings, ImageFetcher, ReqwestFetcher, BROWSER_USER_AGENT, DEFAULT_REFERER,
};
pub use filename::{
    correct_extension, deterministic_filename, existing_variant, extension_for_content_type,
    infer_extension, IMAGE_EXTENSIONS,
};
pub use harvest::{harvest, HarvestLimits, HarvestReport, DEFAULT_SETTLE, DEFAULT_STAGNATION_LIMIT};
pub use page::{BrowserSettings, ChromiumPage, PageDriver, PageError};
pub use persist::{ensure_output_dir, write_url_list, AtomicFileWriter, PersistError};
pub use report::{LogSink, ProgressSink};
pub use types::{
    DownloadError, DownloadErrorKind, DownloadOutcome, EngineEvent, FailureKind, FetchError,
    FetchMetadata, FetchOutput, StopReason, TinyReason,
};
