use std::collections::HashSet;
use std::convert::Infallible;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Directory component encoding pixel dimensions, e.g. `/236x/` or `/75x75_RS/`.
static SIZE_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d+x(?:\d+)?(?:_[A-Za-z]+)?/").expect("size segment regex"));

pub const DEFAULT_CDN_HOST: &str = "i.pinimg.com";
pub const DEFAULT_PREFERRED_SIZE: &str = "736x";

/// Stable dedupe keeping the first occurrence of each URL.
pub fn dedupe<I>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Rewrites size-coded path segments on one CDN host to a preferred size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPromoter {
    host: String,
    replacement: String,
}

impl Default for ResolutionPromoter {
    fn default() -> Self {
        Self::new(DEFAULT_CDN_HOST, DEFAULT_PREFERRED_SIZE)
    }
}

impl ResolutionPromoter {
    pub fn new(host: &str, preferred_size: &str) -> Self {
        Self {
            host: host.to_ascii_lowercase(),
            replacement: format!("/{}/", preferred_size.trim_matches('/')),
        }
    }

    /// Promote `url` to the preferred size. URLs on other hosts and
    /// `/originals/` URLs come back unchanged. Idempotent.
    pub fn promote(&self, url: &str) -> String {
        let on_cdn = Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(|h| h.eq_ignore_ascii_case(&self.host)))
            .unwrap_or(false);
        if !on_cdn {
            return url.to_string();
        }

        let (path_part, query) = match url.find('?') {
            Some(idx) => url.split_at(idx),
            None => (url, ""),
        };
        if path_part.contains("/originals/") {
            return url.to_string();
        }
        let promoted = SIZE_SEGMENT.replace_all(path_part, self.replacement.as_str());
        format!("{promoted}{query}")
    }
}

/// Hostnames a URL must belong to in order to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AllowedHosts {
    /// No filtering.
    #[default]
    Any,
    /// Exact hosts or parent domains, lowercase.
    Only(Vec<String>),
}

impl AllowedHosts {
    /// Parse a comma-separated host list. `*` (alone or as an entry) and a
    /// blank list both mean no filtering.
    pub fn parse(list: &str) -> Self {
        let entries: Vec<String> = list
            .split(',')
            .map(|entry| entry.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|entry| !entry.is_empty())
            .collect();
        if entries.is_empty() || entries.iter().any(|e| e == "*") {
            AllowedHosts::Any
        } else {
            AllowedHosts::Only(entries)
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, AllowedHosts::Any)
    }

    pub fn allows(&self, url: &str) -> bool {
        let entries = match self {
            AllowedHosts::Any => return true,
            AllowedHosts::Only(entries) => entries,
        };
        let Some(host) = Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
        else {
            return false;
        };
        entries.iter().any(|entry| host_matches(&host, entry))
    }
}

impl FromStr for AllowedHosts {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AllowedHosts::parse(s))
    }
}

fn host_matches(host: &str, entry: &str) -> bool {
    host == entry
        || host
            .strip_suffix(entry)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Dedupe, promote resolution, then restrict to the allow-list.
///
/// A second dedupe runs after promotion since two size variants of the same
/// image collapse into one URL.
pub fn post_process(
    urls: Vec<String>,
    promoter: &ResolutionPromoter,
    hosts: &AllowedHosts,
) -> Vec<String> {
    let promoted = dedupe(urls).into_iter().map(|url| promoter.promote(&url));
    dedupe(promoted)
        .into_iter()
        .filter(|url| hosts.allows(url))
        .collect()
}
