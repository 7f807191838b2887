//! Section key derivation
//!
//! A section key is a coarse grouping of pages by their first meaningful
//! path segment, used to cap how many pages are sampled per site section.

use crate::policy::LanguageDetector;
use url::Url;

/// Key assigned to root-path pages and pages with no meaningful segment
pub const ROOT_SECTION: &str = "root";

/// Derives the section key for a URL
///
/// The first non-empty path segment is the key, lowercased; a recognized
/// language prefix is skipped so `/fr/blog/post` and `/blog/post` land in
/// the same `blog` section. Root paths map to [`ROOT_SECTION`].
pub fn section_key(url: &Url, detector: &dyn LanguageDetector) -> String {
    let segments: Vec<&str> = match url.path_segments() {
        Some(s) => s.filter(|seg| !seg.is_empty()).collect(),
        None => return ROOT_SECTION.to_string(),
    };

    let mut iter = segments.iter();
    let first = match iter.next() {
        Some(f) => *f,
        None => return ROOT_SECTION.to_string(),
    };

    let meaningful = if detector.is_language_segment(first) {
        match iter.next() {
            Some(next) => *next,
            None => return ROOT_SECTION.to_string(),
        }
    } else {
        first
    };

    meaningful.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::KnownCodesDetector;

    fn key(s: &str) -> String {
        let detector = KnownCodesDetector::default();
        section_key(&Url::parse(s).unwrap(), &detector)
    }

    #[test]
    fn test_root_path() {
        assert_eq!(key("https://example.com/"), ROOT_SECTION);
    }

    #[test]
    fn test_first_segment() {
        assert_eq!(key("https://example.com/blog/post-1"), "blog");
        assert_eq!(key("https://example.com/Pricing"), "pricing");
    }

    #[test]
    fn test_language_prefix_skipped() {
        assert_eq!(key("https://example.com/fr/blog/post-1"), "blog");
    }

    #[test]
    fn test_bare_language_prefix_is_root() {
        assert_eq!(key("https://example.com/fr"), ROOT_SECTION);
    }
}
