use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::{ArgGroup, Parser};
use engine_logging::{level_for_verbosity, LogOptions};
use harvest_core::{AllowedHosts, ProgressCadence};
use harvest_engine::{CrawlConfig, StartSource, DEFAULT_REFERER};

/// Scroll a rendered search or board page, collect image URLs and download
/// the ones that pass the size checks.
#[derive(Parser, Debug)]
#[command(name = "image-harvest", version, about)]
#[command(group(ArgGroup::new("source").required(true).args(["query", "url"])))]
pub struct Cli {
    /// Search text; opens the pin search results for it.
    #[arg(long)]
    pub query: Option<String>,

    /// Page to start from instead of a search.
    #[arg(long)]
    pub url: Option<String>,

    /// Number of image URLs to collect.
    #[arg(long, default_value_t = 50)]
    pub max_images: usize,

    /// Output directory for downloaded images.
    #[arg(long, default_value = "images")]
    pub out: PathBuf,

    /// Show the browser window.
    #[arg(long)]
    pub headful: bool,

    /// Maximum scroll rounds.
    #[arg(long, default_value_t = 80)]
    pub scrolls: u32,

    /// Parallel downloads.
    #[arg(long, default_value_t = 8)]
    pub concurrency: usize,

    /// Per-download timeout in seconds.
    #[arg(long, default_value_t = 20.0)]
    pub timeout: f64,

    /// Also write the harvested URLs to this file, one per line.
    #[arg(long)]
    pub save_urls: Option<PathBuf>,

    /// Minimum file size in bytes.
    #[arg(long, default_value_t = 10_000)]
    pub min_bytes: u64,

    /// Minimum width and height in pixels; 0 disables the check.
    #[arg(long, default_value_t = 200)]
    pub min_dim: u32,

    /// Comma-separated hosts to download from, or `*` for any.
    #[arg(long, default_value = harvest_core::DEFAULT_CDN_HOST)]
    pub allowed_hosts: String,

    /// Referer sent with image downloads; empty to omit.
    #[arg(long, default_value = DEFAULT_REFERER)]
    pub referer: String,

    /// More output: -v for debug, -vv for trace.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Additional log file, always at debug level or finer.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Downloads between progress lines.
    #[arg(long, default_value_t = 10)]
    pub progress_every: usize,

    /// Scroll rounds between progress lines.
    #[arg(long, default_value_t = 5)]
    pub scroll_log_every: usize,
}

impl Cli {
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            level: level_for_verbosity(self.verbose),
            log_file: self.log_file.clone(),
        }
    }

    pub fn crawl_config(&self) -> anyhow::Result<CrawlConfig> {
        let source = match (&self.query, &self.url) {
            (Some(query), None) => StartSource::Query(query.clone()),
            (None, Some(url)) => StartSource::Url(url.clone()),
            _ => return Err(anyhow!("exactly one of --query or --url is required")),
        };
        let timeout = Duration::try_from_secs_f64(self.timeout)
            .with_context(|| format!("invalid --timeout {}", self.timeout))?;

        let mut config = CrawlConfig::new(source);
        config.harvest.max_images = self.max_images;
        config.harvest.max_scrolls = self.scrolls;
        config.harvest.report = ProgressCadence::new(self.scroll_log_every);
        config.allowed_hosts = AllowedHosts::parse(&self.allowed_hosts);
        config.save_urls = self.save_urls.clone();
        config.download.output_dir = self.out.clone();
        config.download.concurrency = self.concurrency;
        config.download.min_bytes = self.min_bytes;
        config.download.min_dimension = self.min_dim;
        config.download.report = ProgressCadence::new(self.progress_every);
        config.fetch.request_timeout = timeout;
        config.fetch.referer = Some(self.referer.trim().to_string()).filter(|r| !r.is_empty());
        config.browser.headless = !self.headful;

        config.validate()?;
        Ok(config)
    }
}
