use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use harvest_core::{OutcomeKind, OutcomeTally};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Navigating {
        url: String,
    },
    ScrollProgress {
        round: u32,
        max_rounds: u32,
        collected: usize,
    },
    HarvestStopped {
        reason: StopReason,
        rounds: u32,
        collected: usize,
    },
    UrlsReady {
        harvested: usize,
        kept: usize,
    },
    ItemCompleted {
        url: String,
        outcome: DownloadOutcome,
    },
    DownloadProgress {
        completed: usize,
        total: usize,
        tally: OutcomeTally,
    },
    Finished {
        tally: OutcomeTally,
    },
}

/// Why the harvest loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Enough unique URLs were collected.
    Filled,
    /// Several consecutive rounds produced nothing new.
    Stagnated,
    /// The round budget ran out.
    ScrollLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Filled => write!(f, "reached the image limit"),
            StopReason::Stagnated => write!(f, "no new images for several scrolls"),
            StopReason::ScrollLimit => write!(f, "scroll limit reached"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Bytes,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Result of one download attempt, with enough detail to log why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Ok { path: PathBuf, bytes: u64 },
    Skip { path: PathBuf },
    Tiny(TinyReason),
    Error(DownloadError),
}

impl DownloadOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            DownloadOutcome::Ok { .. } => OutcomeKind::Ok,
            DownloadOutcome::Skip { .. } => OutcomeKind::Skip,
            DownloadOutcome::Tiny(_) => OutcomeKind::Tiny,
            DownloadOutcome::Error(_) => OutcomeKind::Error,
        }
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadOutcome::Ok { path, bytes } => {
                write!(f, "saved {} ({bytes} bytes)", path.display())
            }
            DownloadOutcome::Skip { path } => write!(f, "exists as {}", path.display()),
            DownloadOutcome::Tiny(reason) => write!(f, "too small: {reason}"),
            DownloadOutcome::Error(err) => write!(f, "failed: {err}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TinyReason {
    Bytes { actual: u64, min: u64 },
    Dimensions { width: u32, height: u32, min: u32 },
}

impl fmt::Display for TinyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TinyReason::Bytes { actual, min } => write!(f, "{actual} bytes < {min}"),
            TinyReason::Dimensions { width, height, min } => {
                write!(f, "{width}x{height} px < {min}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadError {
    pub kind: DownloadErrorKind,
    pub message: String,
}

impl DownloadError {
    pub(crate) fn new(kind: DownloadErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<FetchError> for DownloadError {
    fn from(err: FetchError) -> Self {
        Self::new(DownloadErrorKind::Fetch(err.kind), err.message)
    }
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadErrorKind {
    Fetch(FailureKind),
    Decode,
    Write,
}

impl fmt::Display for DownloadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadErrorKind::Fetch(kind) => write!(f, "{kind}"),
            DownloadErrorKind::Decode => write!(f, "decode error"),
            DownloadErrorKind::Write => write!(f, "write error"),
        }
    }
}
