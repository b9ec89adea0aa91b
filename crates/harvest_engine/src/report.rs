use engine_logging::{engine_debug, engine_info, engine_trace};

use crate::{DownloadOutcome, EngineEvent};

/// Receives progress from the harvest and download phases.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Renders events as log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::Navigating { url } => engine_info!("Opening: {}", url),
            EngineEvent::ScrollProgress {
                round,
                max_rounds,
                collected,
            } => engine_info!("Scroll {}/{}: collected {} URLs", round, max_rounds, collected),
            EngineEvent::HarvestStopped {
                reason,
                rounds,
                collected,
            } => engine_info!(
                "Stopped collecting after {} scrolls ({}); {} URLs",
                rounds,
                reason,
                collected
            ),
            EngineEvent::UrlsReady { harvested, kept } => {
                engine_info!("Collected {} image URLs ({} harvested)", kept, harvested)
            }
            EngineEvent::ItemCompleted { url, outcome } => match &outcome {
                DownloadOutcome::Ok { .. } | DownloadOutcome::Skip { .. } => {
                    engine_trace!("{} -> {}", url, outcome)
                }
                DownloadOutcome::Tiny(_) | DownloadOutcome::Error(_) => {
                    engine_debug!("{} -> {}", url, outcome)
                }
            },
            EngineEvent::DownloadProgress {
                completed,
                total,
                tally,
            } => engine_info!("[{}/{}] {}", completed, total, tally),
            EngineEvent::Finished { tally } => engine_info!("Done: {}", tally),
        }
    }
}
