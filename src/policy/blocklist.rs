//! Link blocklist
//!
//! Applied to discovered links before they reach the admission chain.
//! Rules are an ordered list of named regex patterns over the URL path,
//! so policy changes are data edits rather than new conditional branches.

use crate::url::{canonicalize_url, same_host};
use regex::Regex;
use url::Url;

/// A single named blocklist rule
struct BlockRule {
    name: &'static str,
    pattern: Regex,
}

/// Ordered blocklist evaluated against every discovered link
pub struct LinkBlocklist {
    rules: Vec<BlockRule>,
}

impl LinkBlocklist {
    /// Builds the default rule set: binary/document extensions, API
    /// endpoints, and asset directories
    pub fn new() -> Self {
        let sources: &[(&str, &str)] = &[
            (
                "document-extension",
                r"(?i)\.(pdf|docx?|xlsx?|pptx?|csv|rtf)$",
            ),
            (
                "archive-extension",
                r"(?i)\.(zip|rar|7z|tar|gz|bz2|dmg|exe|msi)$",
            ),
            (
                "asset-extension",
                r"(?i)\.(png|jpe?g|gif|svg|webp|ico|css|js|mp3|mp4|avi|mov|webm|woff2?|ttf|eot)$",
            ),
            ("api-path", r"(?i)(^|/)api(/|$)"),
            (
                "asset-directory",
                r"(?i)(^|/)(assets|static|media|images|img|css|js|fonts|cdn|wp-content/uploads)(/|$)",
            ),
        ];

        let rules = sources
            .iter()
            .map(|(name, pattern)| BlockRule {
                name,
                pattern: Regex::new(pattern).expect("blocklist patterns are valid"),
            })
            .collect();

        Self { rules }
    }

    /// Returns the name of the first matching rule, or None if the path
    /// passes every rule
    pub fn match_path(&self, path: &str) -> Option<&'static str> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(path))
            .map(|rule| rule.name)
    }

    /// Full pre-admission verdict for a discovered link
    ///
    /// Rejects links that leave the crawl's hostname, links whose path
    /// matches a blocklist rule, and fragment-only / query-only variants of
    /// the page they were found on. Returns a short reason, or None when
    /// the link may proceed to the admission chain.
    pub fn reject_reason(
        &self,
        link: &Url,
        source_page: &Url,
        start_url: &Url,
    ) -> Option<String> {
        if !same_host(link, start_url) {
            return Some("external-host".to_string());
        }

        if let Some(rule) = self.match_path(link.path()) {
            return Some(rule.to_string());
        }

        // A link that differs from its source page only by query or
        // fragment re-captures the same document. Fragments are already
        // stripped by canonicalization, so an equal path is the signal.
        if let Ok(source) = canonicalize_url(source_page) {
            if link.path() == source.path() && link.host_str() == source.host_str() {
                return Some("self-variant".to_string());
            }
        }

        None
    }
}

impl Default for LinkBlocklist {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_document_extensions_blocked() {
        let bl = LinkBlocklist::new();
        assert_eq!(bl.match_path("/files/report.pdf"), Some("document-extension"));
        assert_eq!(bl.match_path("/files/Report.DOCX"), Some("document-extension"));
    }

    #[test]
    fn test_archive_extensions_blocked() {
        let bl = LinkBlocklist::new();
        assert_eq!(bl.match_path("/downloads/release.zip"), Some("archive-extension"));
    }

    #[test]
    fn test_api_paths_blocked() {
        let bl = LinkBlocklist::new();
        assert_eq!(bl.match_path("/api/v2/users"), Some("api-path"));
        assert_eq!(bl.match_path("/docs/api-guide"), None);
    }

    #[test]
    fn test_asset_directories_blocked() {
        let bl = LinkBlocklist::new();
        assert_eq!(bl.match_path("/assets/logo-large"), Some("asset-directory"));
        assert_eq!(bl.match_path("/static/main.css"), Some("asset-extension"));
    }

    #[test]
    fn test_plain_pages_pass() {
        let bl = LinkBlocklist::new();
        assert_eq!(bl.match_path("/pricing"), None);
        assert_eq!(bl.match_path("/blog/2024/launch"), None);
    }

    #[test]
    fn test_external_host_rejected() {
        let bl = LinkBlocklist::new();
        let start = url("https://example.com/");
        let page = url("https://example.com/blog");
        let link = url("https://other.com/blog");
        assert_eq!(
            bl.reject_reason(&link, &page, &start),
            Some("external-host".to_string())
        );
    }

    #[test]
    fn test_query_only_variant_rejected() {
        let bl = LinkBlocklist::new();
        let start = url("https://example.com/");
        let page = url("https://example.com/blog");
        let link = url("https://example.com/blog?sort=asc");
        assert_eq!(
            bl.reject_reason(&link, &page, &start),
            Some("self-variant".to_string())
        );
    }

    #[test]
    fn test_sibling_page_passes() {
        let bl = LinkBlocklist::new();
        let start = url("https://example.com/");
        let page = url("https://example.com/blog");
        let link = url("https://example.com/pricing");
        assert_eq!(bl.reject_reason(&link, &page, &start), None);
    }
}
