mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use engine_logging::{engine_error, engine_info};
use harvest_engine::{ChromiumPage, Crawler, DecoderAvailability, LogSink, ReqwestFetcher};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    engine_logging::initialize(&cli.log_options());

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            engine_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.crawl_config()?;
    let fetcher = ReqwestFetcher::new(config.fetch.clone()).context("building HTTP client")?;
    let browser = config.browser.clone();
    let out = config.download.output_dir.clone();

    let sink = LogSink;
    let crawler = Crawler::new(config, Arc::new(fetcher), DecoderAvailability::detect(), &sink)?;
    let mut page = ChromiumPage::launch(browser)
        .await
        .context("launching browser")?;

    let summary = crawler.run(&mut page).await?;
    engine_info!(
        "Saved images to {} ({} of {} URLs new)",
        out.display(),
        summary.tally.ok,
        summary.urls.len()
    );
    Ok(())
}
