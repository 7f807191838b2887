//! The crawl worker
//!
//! One worker executes one crawl job at a time: claim, run the engine with
//! a freshly-launched browser, record the terminal status. Page failures
//! stay inside the engine; only an error escaping the engine marks the job
//! `failed`.

use crate::browser::{ChromeAutomation, PageAutomation};
use crate::capture::ArtifactWriter;
use crate::config::Settings;
use crate::crawler::{CrawlEngine, CrawlOutcome};
use crate::progress::{HttpProgressSink, ProgressReporter, ProgressSink, StoreProgressSink};
use crate::queue::{CrawlJob, SqliteJobStore};
use crate::url::canonicalize_str;
use crate::{JobError, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Executes queued crawl jobs against a shared job store
pub struct Worker {
    store: Arc<Mutex<SqliteJobStore>>,
    settings: Settings,
}

impl Worker {
    pub fn new(store: Arc<Mutex<SqliteJobStore>>, settings: Settings) -> Self {
        Self { store, settings }
    }

    /// Runs the worker loop until the process is terminated
    pub async fn run(&self) -> Result<()> {
        let poll_interval = Duration::from_millis(self.settings.queue.poll_interval_ms);
        tracing::info!("worker started");

        loop {
            match self.run_next().await? {
                Some(job_id) => {
                    tracing::info!(job_id, "job finished");
                }
                None => {
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }
    }

    /// Claims and executes at most one job
    ///
    /// Returns the executed job's id, or None when the queue was empty.
    pub async fn run_next(&self) -> Result<Option<i64>> {
        let job = {
            let mut store = self.store.lock().expect("job store lock poisoned");
            store.claim_next()?
        };

        let job = match job {
            Some(job) => job,
            None => return Ok(None),
        };

        tracing::info!(job_id = job.id, url = %job.target_url, "job claimed");

        match ChromeAutomation::launch(&self.settings.browser, &job.configuration).await {
            Ok(automation) => {
                self.execute_claimed(&job, automation).await?;
            }
            Err(e) => {
                tracing::error!(job_id = job.id, error = %e, "browser launch failed");
                self.finish(&job, Err(e))?;
            }
        }

        Ok(Some(job.id))
    }

    /// Runs an already-claimed job through the engine and records exactly
    /// one terminal status
    pub async fn execute_claimed<A: PageAutomation>(
        &self,
        job: &CrawlJob,
        automation: A,
    ) -> Result<()> {
        let result = self.run_engine(job, automation).await;

        match &result {
            Ok(outcome) => {
                tracing::info!(
                    job_id = job.id,
                    pages = outcome.pages.len(),
                    "job completed"
                );
            }
            Err(e) => {
                tracing::error!(job_id = job.id, error = %e, "job failed");
            }
        }

        self.finish(job, result)
    }

    async fn run_engine<A: PageAutomation>(
        &self,
        job: &CrawlJob,
        automation: A,
    ) -> std::result::Result<CrawlOutcome, JobError> {
        let start_url = canonicalize_str(&job.target_url)?;

        let artifacts =
            ArtifactWriter::new(&self.settings.artifacts.root_dir, &job.output_base_url)?;

        let sink: Arc<dyn ProgressSink> = match &self.settings.queue.progress_endpoint {
            Some(endpoint) => Arc::new(HttpProgressSink::new(endpoint)),
            None => Arc::new(StoreProgressSink::new(self.store.clone())),
        };
        let reporter = ProgressReporter::new(job.id, sink);

        let engine = CrawlEngine::new(
            job.id,
            start_url,
            job.configuration.clone(),
            automation,
            artifacts,
            reporter,
        );

        engine.run().await
    }

    /// Records the terminal status for a job
    fn finish(
        &self,
        job: &CrawlJob,
        result: std::result::Result<CrawlOutcome, JobError>,
    ) -> Result<()> {
        let mut store = self.store.lock().expect("job store lock poisoned");
        match result {
            Ok(outcome) => store.mark_completed(job.id, &outcome.manifest_url)?,
            Err(e) => store.mark_failed(job.id, &e.to_string())?,
        }
        Ok(())
    }
}
