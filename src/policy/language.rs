//! URL-based language detection
//!
//! Detection is a pluggable strategy so the recognized-code list can be
//! swapped without touching the engine or the admission chain.

use url::Url;

/// Query parameters that carry a language/locale code
const LANGUAGE_QUERY_KEYS: &[&str] = &["lang", "language", "locale", "l"];

/// Language codes recognized by the default detector
pub const DEFAULT_LANGUAGE_CODES: &[&str] = &[
    "en", "fr", "de", "es", "it", "pt", "nl", "ja", "zh", "ko",
];

/// Strategy for detecting a language code from a URL
///
/// Returns `Some(code)` when the URL carries a recognizable marker,
/// `None` otherwise. URLs with no detectable code are always admitted by
/// the language filter.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, url: &Url) -> Option<String>;

    /// Whether a path segment is a recognized language prefix
    ///
    /// Used by section-key derivation to skip `/fr/` style prefixes.
    fn is_language_segment(&self, segment: &str) -> bool;
}

/// Detector backed by a fixed allow-list of language codes
///
/// Checks, in order: a path prefix (`/fr/...`), a language query parameter
/// (`?lang=fr`), and a language subdomain (`fr.example.com`). Region
/// variants like `fr-ca` match on their base code.
pub struct KnownCodesDetector {
    codes: Vec<String>,
}

impl KnownCodesDetector {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            codes: codes.iter().map(|c| c.to_lowercase()).collect(),
        }
    }

    /// Maps a candidate marker (`fr`, `fr-CA`, `fr_CA`) onto a known code
    fn match_code(&self, candidate: &str) -> Option<String> {
        let lowered = candidate.to_lowercase();
        let base = lowered
            .split(['-', '_'])
            .next()
            .unwrap_or(lowered.as_str());

        if self.codes.iter().any(|c| c == base) {
            Some(base.to_string())
        } else {
            None
        }
    }
}

impl Default for KnownCodesDetector {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE_CODES)
    }
}

impl LanguageDetector for KnownCodesDetector {
    fn detect(&self, url: &Url) -> Option<String> {
        // Path prefix: /fr/... (the bare /fr page counts too)
        if let Some(first) = url
            .path_segments()
            .and_then(|mut s| s.find(|seg| !seg.is_empty()))
        {
            // Only short segments qualify; "france" is not a language prefix
            if first.len() <= 5 {
                if let Some(code) = self.match_code(first) {
                    return Some(code);
                }
            }
        }

        // Query parameter: ?lang= / ?language= / ?locale= / ?l=
        for (key, value) in url.query_pairs() {
            if LANGUAGE_QUERY_KEYS.contains(&key.to_lowercase().as_str()) {
                if let Some(code) = self.match_code(&value) {
                    return Some(code);
                }
            }
        }

        // Subdomain: fr.example.com
        if let Some(host) = url.host_str() {
            let labels: Vec<&str> = host.split('.').collect();
            if labels.len() > 2 {
                if let Some(code) = self.match_code(labels[0]) {
                    return Some(code);
                }
            }
        }

        None
    }

    fn is_language_segment(&self, segment: &str) -> bool {
        segment.len() <= 5 && self.match_code(segment).is_some()
    }
}

/// Determines the crawl's default language from the start URL
///
/// Falls back to `"en"` when the start URL carries no detectable marker.
pub fn detect_default_language(detector: &dyn LanguageDetector, start_url: &Url) -> String {
    detector
        .detect(start_url)
        .unwrap_or_else(|| "en".to_string())
}
