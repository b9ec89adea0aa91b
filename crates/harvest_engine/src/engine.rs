use std::path::PathBuf;
use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use harvest_core::{post_process, AllowedHosts, OutcomeTally, ResolutionPromoter};
use url::Url;

use crate::dimensions::DecoderAvailability;
use crate::download::{DownloadPipeline, DownloadSettings};
use crate::fetch::{FetchSettings, ImageFetcher};
use crate::harvest::{harvest, HarvestLimits, HarvestReport};
use crate::page::{BrowserSettings, PageDriver, PageError};
use crate::persist::{write_url_list, PersistError};
use crate::report::ProgressSink;
use crate::{EngineEvent, FetchError};

/// Search page used when the crawl starts from a query.
pub const SEARCH_URL: &str = "https://www.pinterest.com/search/pins/";

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("http client setup failed: {0}")]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartSource {
    Query(String),
    Url(String),
}

impl StartSource {
    pub fn start_url(&self) -> Result<String, CrawlError> {
        match self {
            StartSource::Query(query) => Url::parse_with_params(SEARCH_URL, &[("q", query)])
                .map(String::from)
                .map_err(|err| CrawlError::Config(err.to_string())),
            StartSource::Url(url) => Url::parse(url)
                .map(|_| url.clone())
                .map_err(|err| CrawlError::Config(format!("start url {url:?}: {err}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub source: StartSource,
    pub harvest: HarvestLimits,
    pub allowed_hosts: AllowedHosts,
    pub promoter: ResolutionPromoter,
    /// Where to write the harvested URL list, one per line.
    pub save_urls: Option<PathBuf>,
    pub download: DownloadSettings,
    pub fetch: FetchSettings,
    pub browser: BrowserSettings,
}

impl CrawlConfig {
    pub fn new(source: StartSource) -> Self {
        Self {
            source,
            harvest: HarvestLimits::default(),
            allowed_hosts: AllowedHosts::parse(harvest_core::DEFAULT_CDN_HOST),
            promoter: ResolutionPromoter::default(),
            save_urls: None,
            download: DownloadSettings::default(),
            fetch: FetchSettings::default(),
            browser: BrowserSettings::default(),
        }
    }

    pub fn validate(&self) -> Result<(), CrawlError> {
        self.source.start_url()?;
        if self.harvest.max_images == 0 {
            return Err(CrawlError::Config("max images must be at least 1".into()));
        }
        if self.download.concurrency == 0 {
            return Err(CrawlError::Config("concurrency must be at least 1".into()));
        }
        if self.fetch.request_timeout.is_zero() {
            return Err(CrawlError::Config("download timeout must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub harvest: HarvestReport,
    /// Post-processed URLs handed to the download phase.
    pub urls: Vec<String>,
    pub tally: OutcomeTally,
}

/// Runs a crawl: harvest on a live page, post-process, then download.
pub struct Crawler<'a> {
    config: CrawlConfig,
    fetcher: Arc<dyn ImageFetcher>,
    decoder: DecoderAvailability,
    sink: &'a dyn ProgressSink,
}

impl<'a> Crawler<'a> {
    pub fn new(
        config: CrawlConfig,
        fetcher: Arc<dyn ImageFetcher>,
        decoder: DecoderAvailability,
        sink: &'a dyn ProgressSink,
    ) -> Result<Self, CrawlError> {
        config.validate()?;
        if config.download.min_dimension > 0 && !decoder.is_available() {
            engine_warn!("No image decoder in this build; the minimum dimension check will be skipped.");
        }
        Ok(Self {
            config,
            fetcher,
            decoder,
            sink,
        })
    }

    /// Full crawl. The page is closed once harvesting ends, before any
    /// download starts, whether or not harvesting succeeded.
    pub async fn run(&self, page: &mut dyn PageDriver) -> Result<CrawlSummary, CrawlError> {
        let collected = self.collect(page).await;
        if let Err(err) = page.close().await {
            engine_warn!("{}", err);
        }
        let (harvest, urls) = collected?;
        let tally = self.download(&urls).await?;
        Ok(CrawlSummary {
            harvest,
            urls,
            tally,
        })
    }

    /// Harvest phase plus post-processing. Navigation failure is fatal.
    pub async fn collect(
        &self,
        page: &mut dyn PageDriver,
    ) -> Result<(HarvestReport, Vec<String>), CrawlError> {
        let start_url = self.config.source.start_url()?;
        self.sink.emit(EngineEvent::Navigating {
            url: start_url.clone(),
        });
        page.navigate(&start_url).await?;

        let report = harvest(page, &self.config.harvest, self.sink).await?;

        if let Some(path) = self.config.save_urls.as_deref() {
            write_url_list(path, &report.urls)?;
            engine_info!("Saved URLs to {}", path.display());
        }

        let urls = post_process(
            report.urls.clone(),
            &self.config.promoter,
            &self.config.allowed_hosts,
        );
        self.sink.emit(EngineEvent::UrlsReady {
            harvested: report.urls.len(),
            kept: urls.len(),
        });
        Ok((report, urls))
    }

    /// Download phase over an already post-processed URL list.
    pub async fn download(&self, urls: &[String]) -> Result<OutcomeTally, CrawlError> {
        let pipeline = DownloadPipeline::new(
            self.fetcher.clone(),
            self.decoder.clone(),
            self.config.download.clone(),
        );
        Ok(pipeline.run(urls, self.sink).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_form_encoded_into_search_url() {
        let url = StartSource::Query("nail art & more".into()).start_url().unwrap();
        assert_eq!(
            url,
            "https://www.pinterest.com/search/pins/?q=nail+art+%26+more"
        );
    }

    #[test]
    fn invalid_start_url_is_a_config_error() {
        let err = StartSource::Url("not a url".into()).start_url().unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));
    }
}
