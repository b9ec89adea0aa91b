use std::collections::HashSet;

use serde::Deserialize;

/// Path marker of the medium-resolution tier served by the image CDN.
pub const MEDIUM_RESOLUTION_MARKER: &str = "/736x/";
/// Marker of unscaled originals.
pub const ORIGINALS_MARKER: &str = "originals";

/// Raw attributes of one rendered `<img>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageElement {
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub srcset: Option<String>,
}

impl ImageElement {
    pub fn new(src: Option<&str>, srcset: Option<&str>) -> Self {
        Self {
            src: src.map(str::to_string),
            srcset: srcset.map(str::to_string),
        }
    }
}

/// One entry of the candidate pool. `score` is a declared width in pixels,
/// or a density multiplier scaled by 1000.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub url: String,
    pub score: f64,
}

/// Parse a `srcset` attribute into scored candidates.
///
/// Candidates without a descriptor (or with one that does not parse) score 0.
/// Entries with an empty URL are dropped.
pub fn parse_srcset(srcset: &str) -> Vec<Candidate> {
    srcset
        .split(',')
        .map(str::trim)
        .filter_map(|entry| {
            let mut parts = entry.split_whitespace();
            let url = parts.next()?;
            let score = parts.next().map(descriptor_score).unwrap_or(0.0);
            Some(Candidate {
                url: url.to_string(),
                score,
            })
        })
        .collect()
}

fn descriptor_score(descriptor: &str) -> f64 {
    if let Some(width) = descriptor.strip_suffix('w') {
        // Fractional widths count by their integer part.
        width
            .parse::<f64>()
            .ok()
            .filter(|w| w.is_finite())
            .map(f64::trunc)
            .unwrap_or(0.0)
    } else if let Some(density) = descriptor.strip_suffix('x') {
        density
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
            .map(|d| d * 1000.0)
            .unwrap_or(0.0)
    } else {
        0.0
    }
}

/// Choose the single best URL for one image element.
///
/// The pool holds `src` (score 0) and every `srcset` candidate. A URL in the
/// medium-resolution tier or an originals URL beats any score; otherwise the
/// highest score wins, first entry on ties.
pub fn pick_best(element: &ImageElement) -> Option<String> {
    let mut pool: Vec<Candidate> = Vec::new();
    if let Some(src) = element.src.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        pool.push(Candidate {
            url: src.to_string(),
            score: 0.0,
        });
    }
    if let Some(srcset) = element.srcset.as_deref() {
        pool.extend(parse_srcset(srcset));
    }
    if pool.is_empty() {
        return None;
    }

    // Stable sort keeps document order among equal scores.
    pool.sort_by(|a, b| b.score.total_cmp(&a.score));
    let preferred = pool
        .iter()
        .position(|c| is_preferred_tier(&c.url))
        .unwrap_or(0);
    Some(pool.swap_remove(preferred).url)
}

fn is_preferred_tier(url: &str) -> bool {
    url.contains(MEDIUM_RESOLUTION_MARKER) || url.contains(ORIGINALS_MARKER)
}

/// Best URL per element for one page snapshot, deduplicated, document order.
pub fn extract_candidates(elements: &[ImageElement]) -> Vec<String> {
    let mut seen = HashSet::new();
    elements
        .iter()
        .filter_map(pick_best)
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
