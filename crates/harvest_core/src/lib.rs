//! Harvest core: pure candidate selection, harvest bookkeeping and URL post-processing.
mod candidate;
mod outcome;
mod postprocess;
mod state;

pub use candidate::{
    extract_candidates, parse_srcset, pick_best, Candidate, ImageElement,
    MEDIUM_RESOLUTION_MARKER, ORIGINALS_MARKER,
};
pub use outcome::{OutcomeKind, OutcomeTally, ProgressCadence};
pub use postprocess::{
    dedupe, post_process, AllowedHosts, ResolutionPromoter, DEFAULT_CDN_HOST,
    DEFAULT_PREFERRED_SIZE,
};
pub use state::HarvestState;
