use std::fmt;

/// Terminal classification of one download attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Ok,
    Skip,
    Tiny,
    Error,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutcomeKind::Ok => "ok",
            OutcomeKind::Skip => "skip",
            OutcomeKind::Tiny => "tiny",
            OutcomeKind::Error => "error",
        };
        f.write_str(label)
    }
}

/// Running per-category counters over completed downloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub ok: usize,
    pub skipped: usize,
    pub tiny: usize,
    pub errors: usize,
}

impl OutcomeTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Ok => self.ok += 1,
            OutcomeKind::Skip => self.skipped += 1,
            OutcomeKind::Tiny => self.tiny += 1,
            OutcomeKind::Error => self.errors += 1,
        }
    }

    pub fn completed(&self) -> usize {
        self.ok + self.skipped + self.tiny + self.errors
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        match kind {
            OutcomeKind::Ok => self.ok,
            OutcomeKind::Skip => self.skipped,
            OutcomeKind::Tiny => self.tiny,
            OutcomeKind::Error => self.errors,
        }
    }
}

impl fmt::Display for OutcomeTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ok, {} skipped, {} tiny, {} errors",
            self.ok, self.skipped, self.tiny, self.errors
        )
    }
}

/// Report every `every` items; zero is treated as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressCadence {
    every: usize,
}

impl ProgressCadence {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }

    pub fn every(&self) -> usize {
        self.every
    }

    pub fn is_due(&self, count: usize) -> bool {
        count % self.every == 0
    }

    /// Due on the cadence and always on the final item.
    pub fn is_due_or_last(&self, count: usize, total: usize) -> bool {
        self.is_due(count) || count == total
    }
}

impl Default for ProgressCadence {
    fn default() -> Self {
        Self::new(1)
    }
}
