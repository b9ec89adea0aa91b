use std::time::Duration;

use harvest_core::{extract_candidates, HarvestState, ProgressCadence};

use crate::page::{PageDriver, PageError};
use crate::report::ProgressSink;
use crate::{EngineEvent, StopReason};

pub const DEFAULT_STAGNATION_LIMIT: u32 = 5;
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone)]
pub struct HarvestLimits {
    pub max_images: usize,
    pub max_scrolls: u32,
    /// Consecutive rounds without a new URL before giving up.
    pub stagnation_limit: u32,
    /// Wait after each scroll for lazily loaded content.
    pub settle: Duration,
    pub report: ProgressCadence,
}

impl Default for HarvestLimits {
    fn default() -> Self {
        Self {
            max_images: 50,
            max_scrolls: 80,
            stagnation_limit: DEFAULT_STAGNATION_LIMIT,
            settle: DEFAULT_SETTLE,
            report: ProgressCadence::new(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    /// First-seen order, at most `max_images` long.
    pub urls: Vec<String>,
    pub rounds: u32,
    pub stop_reason: StopReason,
}

/// Scroll the page and collect one best URL per image until the image
/// limit is reached, the page stops yielding new URLs, or the round budget
/// runs out. The page must already be navigated.
pub async fn harvest(
    page: &mut dyn PageDriver,
    limits: &HarvestLimits,
    sink: &dyn ProgressSink,
) -> Result<HarvestReport, PageError> {
    let mut state = HarvestState::new();
    let mut stop_reason = StopReason::ScrollLimit;

    for _ in 0..limits.max_scrolls {
        let round = state.begin_round();
        let elements = page.image_elements().await?;
        state.absorb(extract_candidates(&elements));

        if round == 1 || limits.report.is_due(round as usize) {
            sink.emit(EngineEvent::ScrollProgress {
                round,
                max_rounds: limits.max_scrolls,
                collected: state.len(),
            });
        }

        if state.len() >= limits.max_images {
            stop_reason = StopReason::Filled;
            break;
        }

        page.grow().await?;
        page.settle(limits.settle).await;

        if state.finish_round() >= limits.stagnation_limit {
            stop_reason = StopReason::Stagnated;
            break;
        }
    }

    let rounds = state.rounds();
    sink.emit(EngineEvent::HarvestStopped {
        reason: stop_reason,
        rounds,
        collected: state.len(),
    });

    Ok(HarvestReport {
        urls: state.into_urls(limits.max_images),
        rounds,
        stop_reason,
    })
}
