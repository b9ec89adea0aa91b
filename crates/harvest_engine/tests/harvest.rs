mod common;

use std::fs;
use std::sync::Arc;

use common::{img, img_srcset, Canned, CollectingSink, FakeFetcher, ScriptedPage};
use harvest_engine::{
    harvest, CrawlConfig, CrawlError, Crawler, DecoderAvailability, EngineEvent, HarvestLimits,
    LogSink, StartSource, StopReason,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn limits(max_images: usize, max_scrolls: u32) -> HarvestLimits {
    HarvestLimits {
        max_images,
        max_scrolls,
        ..HarvestLimits::default()
    }
}

#[tokio::test]
async fn harvest_stops_after_consecutive_stagnant_rounds() {
    let mut page = ScriptedPage::new(vec![vec![
        img("https://i.pinimg.com/236x/01/a.jpg"),
        img("https://i.pinimg.com/236x/02/b.jpg"),
    ]]);
    let sink = CollectingSink::default();

    let report = harvest(&mut page, &limits(50, 50), &sink).await.unwrap();

    assert_eq!(report.stop_reason, StopReason::Stagnated);
    assert_eq!(report.rounds, 6);
    assert_eq!(page.grow_calls, 6);
    assert_eq!(report.urls.len(), 2);

    let reported_rounds: Vec<u32> = sink
        .events()
        .iter()
        .filter_map(|event| match event {
            EngineEvent::ScrollProgress { round, .. } => Some(*round),
            _ => None,
        })
        .collect();
    assert_eq!(reported_rounds, vec![1, 5]);
}

#[tokio::test]
async fn harvest_on_empty_page_gives_up_after_stagnation_limit() {
    let mut page = ScriptedPage::new(Vec::new());

    let report = harvest(&mut page, &limits(50, 80), &LogSink).await.unwrap();

    assert_eq!(report.stop_reason, StopReason::Stagnated);
    assert_eq!(report.rounds, 5);
    assert!(report.urls.is_empty());
}

#[tokio::test]
async fn harvest_stops_when_filled_and_keeps_first_discovered() {
    let mut page = ScriptedPage::new(vec![vec![
        img("https://i.pinimg.com/236x/05/e.jpg"),
        img("https://i.pinimg.com/236x/03/c.jpg"),
        img("https://i.pinimg.com/236x/04/d.jpg"),
        img("https://i.pinimg.com/236x/01/a.jpg"),
    ]]);

    let report = harvest(&mut page, &limits(3, 80), &LogSink).await.unwrap();

    assert_eq!(report.stop_reason, StopReason::Filled);
    assert_eq!(report.rounds, 1);
    assert_eq!(page.grow_calls, 0);
    assert_eq!(
        report.urls,
        vec![
            "https://i.pinimg.com/236x/05/e.jpg".to_string(),
            "https://i.pinimg.com/236x/03/c.jpg".to_string(),
            "https://i.pinimg.com/236x/04/d.jpg".to_string(),
        ]
    );
}

#[tokio::test]
async fn harvest_respects_scroll_budget() {
    let rounds: Vec<_> = (0..10)
        .map(|i| vec![img(&format!("https://i.pinimg.com/236x/{i:02}/img.jpg"))])
        .collect();
    let mut page = ScriptedPage::new(rounds);

    let report = harvest(&mut page, &limits(50, 4), &LogSink).await.unwrap();

    assert_eq!(report.stop_reason, StopReason::ScrollLimit);
    assert_eq!(report.rounds, 4);
    assert_eq!(report.urls.len(), 4);
}

#[tokio::test]
async fn harvest_prefers_medium_resolution_from_srcset() {
    let mut page = ScriptedPage::new(vec![vec![img_srcset(
        "https://i.pinimg.com/236x/01/a.jpg",
        "https://i.pinimg.com/474x/01/a.jpg 2x, https://i.pinimg.com/736x/01/a.jpg 3x, \
         https://i.pinimg.com/1200x/01/a.jpg 4x",
    )]]);

    let report = harvest(&mut page, &limits(1, 10), &LogSink).await.unwrap();

    assert_eq!(
        report.urls,
        vec!["https://i.pinimg.com/736x/01/a.jpg".to_string()]
    );
}

#[tokio::test]
async fn crawl_post_processes_downloads_and_saves_raw_urls() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("images");
    let list = temp.path().join("urls.txt");

    let mut page = ScriptedPage::new(vec![vec![
        img("https://i.pinimg.com/236x/aa/u1.jpg"),
        img("https://i.pinimg.com/236x/aa/u1.jpg"),
        img("https://cdn.example.com/u2.jpg"),
    ]]);
    let fetcher = Arc::new(FakeFetcher::new().with_fallback(Canned::body(20_000, "image/jpeg")));
    let sink = CollectingSink::default();

    let mut config = CrawlConfig::new(StartSource::Query("cats".into()));
    config.download.output_dir = out.clone();
    config.save_urls = Some(list.clone());
    let crawler = Crawler::new(
        config,
        fetcher.clone(),
        DecoderAvailability::Unavailable,
        &sink,
    )
    .unwrap();

    let summary = crawler.run(&mut page).await.unwrap();

    assert_eq!(
        page.navigated,
        vec!["https://www.pinterest.com/search/pins/?q=cats".to_string()]
    );
    assert_eq!(page.closed, 1);
    assert_eq!(
        summary.urls,
        vec!["https://i.pinimg.com/736x/aa/u1.jpg".to_string()]
    );
    assert_eq!(summary.tally.ok, 1);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(fs::read_dir(&out).unwrap().count(), 1);

    let saved = fs::read_to_string(&list).unwrap();
    assert_eq!(
        saved.lines().collect::<Vec<_>>(),
        vec![
            "https://i.pinimg.com/236x/aa/u1.jpg",
            "https://cdn.example.com/u2.jpg"
        ]
    );
    assert!(sink
        .events()
        .contains(&EngineEvent::UrlsReady {
            harvested: 2,
            kept: 1
        }));
}

#[tokio::test]
async fn navigation_failure_aborts_before_any_download() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("images");
    let mut page = ScriptedPage::failing_navigation();
    let fetcher = Arc::new(FakeFetcher::new().with_fallback(Canned::body(20_000, "image/jpeg")));

    let mut config = CrawlConfig::new(StartSource::Url("https://www.pinterest.com/ideas/".into()));
    config.download.output_dir = out.clone();
    let crawler = Crawler::new(
        config,
        fetcher.clone(),
        DecoderAvailability::Unavailable,
        &LogSink,
    )
    .unwrap();

    let err = crawler.run(&mut page).await.unwrap_err();

    assert!(matches!(err, CrawlError::Page(_)));
    assert_eq!(page.closed, 1);
    assert_eq!(fetcher.calls(), 0);
    assert!(!out.exists());
}

#[test]
fn invalid_configuration_is_rejected_up_front() {
    let fetcher = Arc::new(FakeFetcher::new());

    let mut config = CrawlConfig::new(StartSource::Query("cats".into()));
    config.harvest.max_images = 0;
    let result = Crawler::new(
        config,
        fetcher.clone(),
        DecoderAvailability::Unavailable,
        &LogSink,
    );
    assert!(matches!(result, Err(CrawlError::Config(_))));

    let mut config = CrawlConfig::new(StartSource::Query("cats".into()));
    config.download.concurrency = 0;
    let result = Crawler::new(config, fetcher, DecoderAvailability::Unavailable, &LogSink);
    assert!(matches!(result, Err(CrawlError::Config(_))));
}

#[tokio::test]
async fn missing_decoder_degrades_to_byte_checks_only() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("images");
    let mut page = ScriptedPage::new(vec![vec![
        img("https://i.pinimg.com/236x/aa/u1.jpg"),
        img("https://i.pinimg.com/236x/bb/u2.jpg"),
    ]]);
    // Bodies are not decodable images; with no decoder they are still kept.
    let fetcher = Arc::new(FakeFetcher::new().with_fallback(Canned::body(20_000, "image/jpeg")));

    let mut config = CrawlConfig::new(StartSource::Query("cats".into()));
    config.download.output_dir = out.clone();
    config.download.min_dimension = 200;
    let crawler = Crawler::new(
        config,
        fetcher.clone(),
        DecoderAvailability::Unavailable,
        &LogSink,
    )
    .expect("a missing decoder is not a configuration error");

    let summary = crawler.run(&mut page).await.unwrap();

    assert_eq!(summary.tally.ok, 2);
    assert_eq!(summary.tally.errors, 0);
    assert_eq!(fs::read_dir(&out).unwrap().count(), 2);
}
