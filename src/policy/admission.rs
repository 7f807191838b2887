//! Page admission chain
//!
//! Five ordered checks, short-circuiting on the first failure:
//!
//! 1. Dedup - canonical URL already admitted
//! 2. Language - non-default language markers (when enabled)
//! 3. Depth - non-empty path segments vs. the configured maximum
//! 4. Section sampling - per-section admission cap
//! 5. Global budget - total admitted pages vs. the crawl-wide maximum
//!
//! Every discovered link runs the full chain at discovery time; nothing is
//! cached, because the section and budget counters move while the crawl is
//! running.

use crate::config::CrawlConfiguration;
use crate::policy::{detect_default_language, section_key, LanguageDetector};
use crate::state::CrawlSession;
use crate::url::path_depth;
use std::sync::Arc;
use url::Url;

/// Why a URL was turned away
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    AlreadyVisited,
    NonDefaultLanguage(String),
    TooDeep(u32),
    SectionSampled(String),
    BudgetExhausted,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyVisited => write!(f, "already visited"),
            Self::NonDefaultLanguage(code) => write!(f, "non-default language '{code}'"),
            Self::TooDeep(depth) => write!(f, "path depth {depth} over limit"),
            Self::SectionSampled(section) => write!(f, "section '{section}' fully sampled"),
            Self::BudgetExhausted => write!(f, "page budget exhausted"),
        }
    }
}

/// Outcome of the admission chain
#[derive(Debug)]
pub enum Verdict {
    /// Admitted; the session counters have been updated
    Admitted,
    Rejected(RejectReason),
}

/// The ordered admission filter for one crawl job
pub struct AdmissionPolicy {
    max_pages: u32,
    max_depth: u32,
    sample_size: u32,
    default_language_only: bool,
    default_language: String,
    detector: Arc<dyn LanguageDetector>,
}

impl AdmissionPolicy {
    /// Builds the policy for a crawl
    ///
    /// The default language is detected from the start URL (falling back to
    /// `"en"`) so language filtering has a fixed reference for the whole
    /// job.
    pub fn new(
        config: &CrawlConfiguration,
        start_url: &Url,
        detector: Arc<dyn LanguageDetector>,
    ) -> Self {
        let default_language = detect_default_language(detector.as_ref(), start_url);
        Self {
            max_pages: config.max_pages,
            max_depth: config.max_depth,
            sample_size: config.sample_size,
            default_language_only: config.default_language_only,
            default_language,
            detector,
        }
    }

    /// Runs the chain for one URL, mutating the session on admission
    pub fn evaluate(&self, url: &Url, session: &mut CrawlSession) -> Verdict {
        let canonical = url.as_str();

        // 1. Dedup
        if session.is_visited(canonical) {
            return Verdict::Rejected(RejectReason::AlreadyVisited);
        }

        // 2. Language
        if self.default_language_only {
            if let Some(code) = self.detector.detect(url) {
                if code != self.default_language {
                    return Verdict::Rejected(RejectReason::NonDefaultLanguage(code));
                }
            }
        }

        // 3. Depth
        let depth = path_depth(url);
        if self.max_depth > 0 && depth > self.max_depth {
            return Verdict::Rejected(RejectReason::TooDeep(depth));
        }

        // 4. Section sampling
        let section = section_key(url, self.detector.as_ref());
        if self.sample_size > 0 && session.section_count(&section) >= self.sample_size {
            return Verdict::Rejected(RejectReason::SectionSampled(section));
        }

        // 5. Global budget; the triggering rejection flips the terminating
        // flag so the engine stops admitting entirely.
        if self.max_pages > 0 && session.pages_admitted() >= self.max_pages {
            session.set_terminating();
            return Verdict::Rejected(RejectReason::BudgetExhausted);
        }

        session.record_admission(canonical, &section);
        Verdict::Admitted
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::KnownCodesDetector;

    fn policy(config: CrawlConfiguration, start: &str) -> AdmissionPolicy {
        let start_url = Url::parse(start).unwrap();
        AdmissionPolicy::new(&config, &start_url, Arc::new(KnownCodesDetector::default()))
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn assert_admitted(policy: &AdmissionPolicy, session: &mut CrawlSession, u: &str) {
        assert!(
            matches!(policy.evaluate(&url(u), session), Verdict::Admitted),
            "expected {u} to be admitted"
        );
    }

    fn assert_rejected(
        policy: &AdmissionPolicy,
        session: &mut CrawlSession,
        u: &str,
        reason: RejectReason,
    ) {
        match policy.evaluate(&url(u), session) {
            Verdict::Rejected(r) => assert_eq!(r, reason),
            Verdict::Admitted => panic!("expected {u} to be rejected"),
        }
    }

    #[test]
    fn test_dedup_rejects_revisit() {
        let p = policy(CrawlConfiguration::default(), "https://example.com/");
        let mut session = CrawlSession::new();

        assert_admitted(&p, &mut session, "https://example.com/a");
        assert_rejected(
            &p,
            &mut session,
            "https://example.com/a",
            RejectReason::AlreadyVisited,
        );
    }

    #[test]
    fn test_language_filter() {
        let config = CrawlConfiguration {
            default_language_only: true,
            ..CrawlConfiguration::default()
        };
        let p = policy(config, "https://example.com/");
        let mut session = CrawlSession::new();

        // Default language detected from the start URL is "en"
        assert_rejected(
            &p,
            &mut session,
            "https://example.com/fr/pricing",
            RejectReason::NonDefaultLanguage("fr".to_string()),
        );
        // Explicit default-language marker is fine
        assert_admitted(&p, &mut session, "https://example.com/en/pricing");
        // No detectable marker is always admitted
        assert_admitted(&p, &mut session, "https://example.com/about");
    }

    #[test]
    fn test_language_filter_disabled() {
        let p = policy(CrawlConfiguration::default(), "https://example.com/");
        let mut session = CrawlSession::new();
        assert_admitted(&p, &mut session, "https://example.com/fr/pricing");
    }

    #[test]
    fn test_depth_limit() {
        let config = CrawlConfiguration {
            max_depth: 2,
            ..CrawlConfiguration::default()
        };
        let p = policy(config, "https://example.com/");
        let mut session = CrawlSession::new();

        assert_admitted(&p, &mut session, "https://example.com/a/b");
        assert_rejected(
            &p,
            &mut session,
            "https://example.com/a/b/c",
            RejectReason::TooDeep(3),
        );
    }

    #[test]
    fn test_depth_unlimited_when_zero() {
        let p = policy(CrawlConfiguration::default(), "https://example.com/");
        let mut session = CrawlSession::new();
        assert_admitted(&p, &mut session, "https://example.com/a/b/c/d/e/f");
    }

    #[test]
    fn test_section_sampling_in_discovery_order() {
        let config = CrawlConfiguration {
            sample_size: 2,
            ..CrawlConfiguration::default()
        };
        let p = policy(config, "https://example.com/");
        let mut session = CrawlSession::new();

        assert_admitted(&p, &mut session, "https://example.com/blog/1");
        assert_admitted(&p, &mut session, "https://example.com/blog/2");
        assert_rejected(
            &p,
            &mut session,
            "https://example.com/blog/3",
            RejectReason::SectionSampled("blog".to_string()),
        );
        // Other sections are unaffected
        assert_admitted(&p, &mut session, "https://example.com/docs/1");
    }

    #[test]
    fn test_budget_flips_terminating_flag() {
        let config = CrawlConfiguration {
            max_pages: 2,
            ..CrawlConfiguration::default()
        };
        let p = policy(config, "https://example.com/");
        let mut session = CrawlSession::new();

        assert_admitted(&p, &mut session, "https://example.com/a");
        assert_admitted(&p, &mut session, "https://example.com/b");
        assert!(!session.is_terminating());

        assert_rejected(
            &p,
            &mut session,
            "https://example.com/c",
            RejectReason::BudgetExhausted,
        );
        assert!(session.is_terminating());
    }
}
