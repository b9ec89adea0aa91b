use std::collections::HashSet;

/// Accumulated harvest progress for one crawl.
///
/// URLs are kept in first-seen order so that truncation yields the first N
/// discovered, independent of hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestState {
    urls: Vec<String>,
    seen: HashSet<String>,
    rounds: u32,
    stagnant_rounds: u32,
    len_at_last_round: usize,
}

impl HarvestState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new round and return its 1-based number.
    pub fn begin_round(&mut self) -> u32 {
        self.rounds += 1;
        self.rounds
    }

    /// Add URLs not seen before. Returns how many were new.
    pub fn absorb<I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.urls.len();
        for url in urls {
            if self.seen.insert(url.clone()) {
                self.urls.push(url);
            }
        }
        self.urls.len() - before
    }

    /// Close the current round: reset the stagnation counter if the set grew
    /// since the previous round, otherwise bump it. Returns the counter.
    pub fn finish_round(&mut self) -> u32 {
        if self.urls.len() == self.len_at_last_round {
            self.stagnant_rounds += 1;
        } else {
            self.stagnant_rounds = 0;
        }
        self.len_at_last_round = self.urls.len();
        self.stagnant_rounds
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn stagnant_rounds(&self) -> u32 {
        self.stagnant_rounds
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Freeze the state into the first `max` URLs discovered.
    pub fn into_urls(mut self, max: usize) -> Vec<String> {
        self.urls.truncate(max);
        self.urls
    }
}
