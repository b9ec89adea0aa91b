use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Extensions kept from the URL path; anything else is saved as `.jpg`.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];
const FALLBACK_EXTENSION: &str = "jpg";
const HASH_BYTES: usize = 8;

/// Deterministic filename for an image URL: `{short_hash(url)}.{ext}`.
///
/// The hash covers the whole URL string, so the same URL always maps to the
/// same name regardless of what the server returns.
pub fn deterministic_filename(url: &str) -> String {
    format!("{}.{}", short_hash(url), infer_extension(url))
}

/// Lowercase extension from the URL path, ignoring query and fragment.
pub fn infer_extension(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    last_segment
        .rsplit_once('.')
        .and_then(|(_, ext)| {
            IMAGE_EXTENSIONS
                .iter()
                .copied()
                .find(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(FALLBACK_EXTENSION)
}

/// Extension implied by an `image/*` content type, if recognised.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next().unwrap_or(content_type).trim();
    let subtype = mime
        .split_once('/')
        .filter(|(top, _)| top.eq_ignore_ascii_case("image"))
        .map(|(_, sub)| sub.to_ascii_lowercase())?;
    match subtype.as_str() {
        "jpeg" | "jpg" | "pjpeg" => Some("jpg"),
        "png" => Some("png"),
        "webp" => Some("webp"),
        "gif" => Some("gif"),
        _ => None,
    }
}

/// Rewrite `filename`'s extension to match the reported content type.
/// `.jpeg` and `.jpg` are treated as the same format.
pub fn correct_extension(filename: &str, content_type: Option<&str>) -> String {
    let Some(reported) = content_type.and_then(extension_for_content_type) else {
        return filename.to_string();
    };
    let (stem, current) = filename.rsplit_once('.').unwrap_or((filename, ""));
    if same_format(current, reported) {
        filename.to_string()
    } else {
        format!("{stem}.{reported}")
    }
}

fn same_format(a: &str, b: &str) -> bool {
    let normalize = |ext: &str| {
        let lower = ext.to_ascii_lowercase();
        if lower == "jpeg" {
            "jpg".to_string()
        } else {
            lower
        }
    };
    normalize(a) == normalize(b)
}

/// Any file in `dir` with the same stem as `filename` and a known image
/// extension. Covers files whose extension was corrected on an earlier run.
pub fn existing_variant(dir: &Path, filename: &str) -> Option<PathBuf> {
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|candidate| candidate.is_file())
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(HASH_BYTES * 2);
    for byte in digest.iter().take(HASH_BYTES) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_sixteen_hex_chars() {
        let hash = short_hash("https://example.com/a.jpg");
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn extension_comes_from_path_only() {
        assert_eq!(infer_extension("https://x.example/a/b.PNG?w=1"), "png");
        assert_eq!(infer_extension("https://x.example/a/b.webp#frag"), "webp");
        assert_eq!(infer_extension("https://x.example/a/b"), "jpg");
        assert_eq!(infer_extension("https://x.example/a.png/b.svg"), "jpg");
        assert_eq!(infer_extension("https://x.example/img?name=a.png"), "jpg");
    }
}
