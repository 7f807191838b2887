//! Crawl engine
//!
//! Drives one crawl job from start URL to written manifest. Exactly one
//! page is in flight at any time; the frontier holds only URLs that have
//! already passed admission, so the page budget bounds the queue itself.

use crate::browser::PageAutomation;
use crate::capture::ArtifactWriter;
use crate::config::CrawlConfiguration;
use crate::crawler::pipeline;
use crate::output::{build_site_tree, Manifest, PageRecord};
use crate::policy::{AdmissionPolicy, KnownCodesDetector, LinkBlocklist, Verdict};
use crate::progress::{ProgressReporter, Stage};
use crate::state::CrawlSession;
use crate::JobError;
use chrono::Utc;
use rand::Rng;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Maximum jitter applied around the configured inter-request delay
const DELAY_JITTER_MS: i64 = 250;

/// Pause between the last page finishing and browser teardown, letting the
/// final handler return cleanly
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// What a finished crawl hands back to the worker
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Records of every page that survived the pipeline
    pub pages: Vec<PageRecord>,

    /// Where the manifest landed on disk
    pub manifest_path: PathBuf,

    /// Public URL of the manifest
    pub manifest_url: String,
}

/// The crawl orchestrator for a single job
pub struct CrawlEngine<A: PageAutomation> {
    job_id: i64,
    start_url: Url,
    config: CrawlConfiguration,
    automation: A,
    artifacts: ArtifactWriter,
    reporter: ProgressReporter,
    policy: AdmissionPolicy,
    blocklist: LinkBlocklist,
    session: CrawlSession,
}

impl<A: PageAutomation> CrawlEngine<A> {
    /// Builds the engine for one job
    ///
    /// `start_url` must already be canonical (the worker canonicalizes the
    /// job's target URL before constructing the engine).
    pub fn new(
        job_id: i64,
        start_url: Url,
        config: CrawlConfiguration,
        automation: A,
        artifacts: ArtifactWriter,
        reporter: ProgressReporter,
    ) -> Self {
        let detector = Arc::new(KnownCodesDetector::default());
        let policy = AdmissionPolicy::new(&config, &start_url, detector);

        Self {
            job_id,
            start_url,
            config,
            automation,
            artifacts,
            reporter,
            policy,
            blocklist: LinkBlocklist::new(),
            session: CrawlSession::new(),
        }
    }

    /// Runs the crawl to completion and writes the manifest
    ///
    /// Page-level failures are absorbed here; an error return means the
    /// whole job failed.
    pub async fn run(mut self) -> Result<CrawlOutcome, JobError> {
        tracing::info!(
            job_id = self.job_id,
            start_url = %self.start_url,
            max_pages = self.config.max_pages,
            max_depth = self.config.max_depth,
            sample_size = self.config.sample_size,
            rpm = self.config.requests_per_minute(),
            "starting crawl"
        );

        self.reporter.report(Stage::Starting, 0, 0, None, 0).await;
        self.bootstrap_auth().await;

        let mut frontier: VecDeque<Url> = VecDeque::new();
        match self.policy.evaluate(&self.start_url, &mut self.session) {
            Verdict::Admitted => frontier.push_back(self.start_url.clone()),
            Verdict::Rejected(reason) => {
                // A start URL deeper than max_depth can reject itself; the
                // job still completes, with an empty manifest tree.
                tracing::warn!(%reason, "start URL was not admitted");
            }
        }

        let mut pages: Vec<PageRecord> = Vec::new();
        let mut processed: u32 = 0;

        while let Some(url) = frontier.pop_front() {
            self.politeness_delay().await;

            processed += 1;
            let total = self.total_pages_estimate();
            self.reporter
                .report(
                    Stage::Crawling,
                    processed,
                    total,
                    Some(url.as_str()),
                    page_percent(processed, total),
                )
                .await;

            match pipeline::process_page(&mut self.automation, &self.artifacts, &url).await {
                Ok(outcome) => {
                    self.enqueue_discovered(&url, outcome.links, &mut frontier);
                    pages.push(outcome.record);
                }
                Err(e) => {
                    tracing::warn!(%url, error = %e, "page dropped");
                }
            }

            if self.session.is_terminating() && frontier.is_empty() {
                tracing::info!(
                    job_id = self.job_id,
                    pages = self.session.pages_admitted(),
                    "page budget reached"
                );
            }
        }

        // Let the last page's handler settle before tearing Chrome down.
        tokio::time::sleep(SHUTDOWN_GRACE).await;
        self.automation.shutdown().await;

        self.reporter
            .report(Stage::BuildingManifest, processed, processed, None, 95)
            .await;

        let tree = build_site_tree(&pages, self.start_url.as_str());
        if tree.is_none() {
            tracing::warn!(job_id = self.job_id, "crawl produced no pages");
        }

        let manifest = Manifest {
            start_url: self.start_url.to_string(),
            crawl_date: Utc::now(),
            tree,
        };
        let (manifest_path, manifest_url) = self.artifacts.write_manifest(self.job_id, &manifest)?;

        self.reporter
            .report(Stage::Finalizing, processed, processed, None, 100)
            .await;

        tracing::info!(
            job_id = self.job_id,
            pages = pages.len(),
            manifest = %manifest_url,
            "crawl finished"
        );

        Ok(CrawlOutcome {
            pages,
            manifest_path,
            manifest_url,
        })
    }

    /// Establishes the authenticated context, once; failure is logged and
    /// the crawl continues unauthenticated
    async fn bootstrap_auth(&mut self) {
        let auth = match self.config.auth.clone() {
            Some(auth) => auth,
            None => return,
        };

        self.reporter
            .report(Stage::Authenticating, 0, 0, None, 0)
            .await;

        if let Err(e) = self
            .automation
            .bootstrap_auth(&auth, &self.start_url)
            .await
        {
            tracing::warn!(
                job_id = self.job_id,
                error = %e,
                "authentication failed, continuing unauthenticated"
            );
        }
    }

    /// Runs every discovered link through the blocklist and the admission
    /// chain, queueing the survivors
    fn enqueue_discovered(
        &mut self,
        source_page: &Url,
        links: Vec<Url>,
        frontier: &mut VecDeque<Url>,
    ) {
        for link in links {
            if let Some(reason) =
                self.blocklist
                    .reject_reason(&link, source_page, &self.start_url)
            {
                tracing::trace!(%link, reason, "link blocked");
                continue;
            }

            match self.policy.evaluate(&link, &mut self.session) {
                Verdict::Admitted => frontier.push_back(link),
                Verdict::Rejected(reason) => {
                    tracing::trace!(%link, %reason, "link rejected");
                }
            }
        }
    }

    /// Sleeps the configured inter-request delay, jittered by up to
    /// ±250 ms, before a navigation
    async fn politeness_delay(&self) {
        let base = self.config.request_delay_ms as i64;
        let jitter = rand::thread_rng().gen_range(-DELAY_JITTER_MS..=DELAY_JITTER_MS);
        let delay = (base + jitter).max(0) as u64;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    /// Best current guess at the crawl's total page count
    fn total_pages_estimate(&self) -> u32 {
        if self.config.max_pages > 0 {
            self.config.max_pages
        } else {
            self.session.pages_admitted()
        }
    }
}

/// Percent-complete for the page loop, saturating below 100 until the
/// manifest stages run
fn page_percent(processed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    (((processed.saturating_sub(1)) * 90) / total).min(90) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_percent() {
        assert_eq!(page_percent(1, 10), 0);
        assert_eq!(page_percent(6, 10), 45);
        assert_eq!(page_percent(10, 10), 81);
        assert_eq!(page_percent(5, 0), 0);
    }
}
