use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use engine_logging::engine_info;
use futures_util::stream::{self, StreamExt};
use harvest_core::{OutcomeTally, ProgressCadence};

use crate::dimensions::DecoderAvailability;
use crate::fetch::ImageFetcher;
use crate::filename::{correct_extension, deterministic_filename, existing_variant};
use crate::persist::{ensure_output_dir, AtomicFileWriter, PersistError};
use crate::report::ProgressSink;
use crate::{DownloadError, DownloadErrorKind, DownloadOutcome, EngineEvent, TinyReason};

/// Bodies below this size are never images worth keeping.
pub const MIN_BODY_BYTES: u64 = 1024;

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub output_dir: PathBuf,
    /// Maximum downloads in flight; zero is treated as one.
    pub concurrency: usize,
    /// Minimum body size; the effective floor is never below [`MIN_BODY_BYTES`].
    pub min_bytes: u64,
    /// Minimum width and height in pixels; zero disables the check.
    pub min_dimension: u32,
    pub report: ProgressCadence,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("images"),
            concurrency: 8,
            min_bytes: 10_000,
            min_dimension: 200,
            report: ProgressCadence::new(10),
        }
    }
}

/// Fetches, validates and stores images with bounded concurrency.
pub struct DownloadPipeline {
    fetcher: Arc<dyn ImageFetcher>,
    decoder: DecoderAvailability,
    writer: AtomicFileWriter,
    settings: DownloadSettings,
}

impl DownloadPipeline {
    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        decoder: DecoderAvailability,
        settings: DownloadSettings,
    ) -> Self {
        let writer = AtomicFileWriter::new(settings.output_dir.clone());
        Self {
            fetcher,
            decoder,
            writer,
            settings,
        }
    }

    pub fn min_body_bytes(&self) -> u64 {
        self.settings.min_bytes.max(MIN_BODY_BYTES)
    }

    /// Download every URL and tally the outcomes in completion order.
    ///
    /// Only a missing or unwritable output directory fails the batch; every
    /// per-URL problem ends up in the tally.
    pub async fn run(
        &self,
        urls: &[String],
        sink: &dyn ProgressSink,
    ) -> Result<OutcomeTally, PersistError> {
        ensure_output_dir(&self.settings.output_dir)?;

        let total = urls.len();
        let mut tally = OutcomeTally::new();
        if total == 0 {
            engine_info!("No URLs to download");
            sink.emit(EngineEvent::Finished { tally });
            return Ok(tally);
        }

        let mut completions = stream::iter(urls)
            .map(move |url| async move { (url, self.download_one(url).await) })
            .buffer_unordered(self.settings.concurrency.max(1));

        while let Some((url, outcome)) = completions.next().await {
            tally.record(outcome.kind());
            sink.emit(EngineEvent::ItemCompleted {
                url: url.clone(),
                outcome,
            });
            let completed = tally.completed();
            if self.settings.report.is_due_or_last(completed, total) {
                sink.emit(EngineEvent::DownloadProgress {
                    completed,
                    total,
                    tally,
                });
            }
        }

        sink.emit(EngineEvent::Finished { tally });
        Ok(tally)
    }

    /// One best-effort attempt for one URL. Never panics, never retries.
    pub async fn download_one(&self, url: &str) -> DownloadOutcome {
        let filename = deterministic_filename(url);
        if let Some(path) = existing_variant(self.writer.dir(), &filename) {
            return DownloadOutcome::Skip { path };
        }

        let output = match self.fetcher.fetch(url).await {
            Ok(output) => output,
            Err(err) => return DownloadOutcome::Error(err.into()),
        };

        let actual = output.bytes.len() as u64;
        let min = self.min_body_bytes();
        if actual < min {
            return DownloadOutcome::Tiny(TinyReason::Bytes { actual, min });
        }

        let filename = correct_extension(&filename, output.metadata.content_type.as_deref());

        let min_dimension = self.settings.min_dimension;
        if min_dimension > 0 {
            if let Some(decoder) = self.decoder.decoder() {
                match decoder.dimensions(&output.bytes) {
                    Ok(dims) if dims.is_below(min_dimension) => {
                        return DownloadOutcome::Tiny(TinyReason::Dimensions {
                            width: dims.width,
                            height: dims.height,
                            min: min_dimension,
                        });
                    }
                    Ok(_) => {}
                    Err(err) => {
                        return DownloadOutcome::Error(DownloadError::new(
                            DownloadErrorKind::Decode,
                            err.to_string(),
                        ));
                    }
                }
            }
        }

        match self.persist(filename, output.bytes).await {
            Ok(path) => DownloadOutcome::Ok {
                path,
                bytes: actual,
            },
            Err(message) => {
                DownloadOutcome::Error(DownloadError::new(DownloadErrorKind::Write, message))
            }
        }
    }

    /// Write and fsync on the blocking pool so other downloads keep moving.
    async fn persist(&self, filename: String, bytes: Bytes) -> Result<PathBuf, String> {
        let writer = self.writer.clone();
        tokio::task::spawn_blocking(move || writer.write(&filename, &bytes))
            .await
            .map_err(|err| err.to_string())?
            .map_err(|err| err.to_string())
    }
}
