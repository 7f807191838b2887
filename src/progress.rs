//! Best-effort progress reporting
//!
//! The crawl loop pushes a snapshot of where it is after every page. The
//! push must never slow down or fail the crawl: every delivery is bounded
//! by a hard timeout, a failed delivery is dropped, and at most one warning
//! is logged per job no matter how many deliveries fail.

use crate::queue::{ProgressSnapshot, SqliteJobStore};
use crate::QueueResult;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Hard ceiling on a single progress delivery
pub const PUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Crawl stages surfaced to the outside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Starting,
    Authenticating,
    Crawling,
    BuildingManifest,
    Finalizing,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Authenticating => "authenticating",
            Self::Crawling => "crawling",
            Self::BuildingManifest => "building-manifest",
            Self::Finalizing => "finalizing",
        }
    }
}

/// Destination for progress snapshots
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn push(&self, job_id: i64, snapshot: &ProgressSnapshot) -> anyhow::Result<()>;
}

/// Sink that overwrites the job row in the local queue database
pub struct StoreProgressSink {
    store: Arc<Mutex<SqliteJobStore>>,
}

impl StoreProgressSink {
    pub fn new(store: Arc<Mutex<SqliteJobStore>>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ProgressSink for StoreProgressSink {
    async fn push(&self, job_id: i64, snapshot: &ProgressSnapshot) -> anyhow::Result<()> {
        let result: QueueResult<()> = {
            let mut store = self.store.lock().expect("job store lock poisoned");
            store.update_progress(job_id, snapshot)
        };
        result.map_err(Into::into)
    }
}

/// Sink that POSTs snapshots to a remote ingest endpoint
///
/// Used when workers run on a different host than the job store's owner.
pub struct HttpProgressSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpProgressSink {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ProgressSink for HttpProgressSink {
    async fn push(&self, job_id: i64, snapshot: &ProgressSnapshot) -> anyhow::Result<()> {
        let url = format!("{}/jobs/{job_id}/progress", self.endpoint);
        let response = self
            .client
            .post(&url)
            .timeout(PUSH_TIMEOUT)
            .json(snapshot)
            .send()
            .await?;
        response.error_for_status()?;
        Ok(())
    }
}

/// Best-effort notifier bound to one job
pub struct ProgressReporter {
    job_id: i64,
    sink: Arc<dyn ProgressSink>,
    timeout: Duration,
    warned: AtomicBool,
}

impl ProgressReporter {
    pub fn new(job_id: i64, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            job_id,
            sink,
            timeout: PUSH_TIMEOUT,
            warned: AtomicBool::new(false),
        }
    }

    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pushes a snapshot, never propagating failure
    pub async fn report(
        &self,
        stage: Stage,
        current_page: u32,
        total_pages: u32,
        current_url: Option<&str>,
        percent: u8,
    ) {
        let snapshot = ProgressSnapshot {
            stage: stage.as_str().to_string(),
            current_page,
            total_pages,
            current_url: current_url.map(str::to_string),
            percent: percent.min(100),
        };

        match tokio::time::timeout(self.timeout, self.sink.push(self.job_id, &snapshot)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.warn_once(&format!("progress delivery failed: {e}")),
            Err(_) => self.warn_once("progress delivery timed out"),
        }
    }

    /// Logs the first delivery failure for this job; later ones are dropped
    /// silently so a dead endpoint cannot flood the log
    fn warn_once(&self, message: &str) {
        if !self.warned.swap(true, Ordering::Relaxed) {
            tracing::warn!(job_id = self.job_id, "{message} (suppressing further warnings)");
        }
    }

    /// Whether at least one delivery failed for this job
    pub fn delivery_failed(&self) -> bool {
        self.warned.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    #[async_trait]
    impl ProgressSink for FailingSink {
        async fn push(&self, _job_id: i64, _snapshot: &ProgressSnapshot) -> anyhow::Result<()> {
            anyhow::bail!("sink unavailable")
        }
    }

    struct SlowSink;

    #[async_trait]
    impl ProgressSink for SlowSink {
        async fn push(&self, _job_id: i64, _snapshot: &ProgressSnapshot) -> anyhow::Result<()> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_sink_writes_snapshot() {
        let mut store = SqliteJobStore::new_in_memory().unwrap();
        let request: crate::config::CrawlRequest = serde_json::from_str(
            r#"{"url": "https://example.com", "outputBaseUrl": "https://cdn.example.com"}"#,
        )
        .unwrap();
        let id = store.enqueue(&request).unwrap();
        let store = Arc::new(Mutex::new(store));

        let reporter = ProgressReporter::new(id, Arc::new(StoreProgressSink::new(store.clone())));
        reporter
            .report(Stage::Crawling, 2, 10, Some("https://example.com/a"), 20)
            .await;

        let job = store.lock().unwrap().get_job(id).unwrap();
        let progress = job.progress.unwrap();
        assert_eq!(progress.stage, "crawling");
        assert_eq!(progress.current_page, 2);
        assert_eq!(progress.percent, 20);
        assert!(!reporter.delivery_failed());
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let reporter = ProgressReporter::new(1, Arc::new(FailingSink));

        // Multiple failing pushes: none propagate, flag latches after one
        for i in 0..3 {
            reporter.report(Stage::Crawling, i, 10, None, 0).await;
        }
        assert!(reporter.delivery_failed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_sink_times_out() {
        let reporter =
            ProgressReporter::new(1, Arc::new(SlowSink)).with_timeout(Duration::from_millis(50));
        reporter.report(Stage::Crawling, 1, 10, None, 10).await;
        assert!(reporter.delivery_failed());
    }

    #[tokio::test]
    async fn test_percent_is_capped() {
        let mut store = SqliteJobStore::new_in_memory().unwrap();
        let request: crate::config::CrawlRequest = serde_json::from_str(
            r#"{"url": "https://example.com", "outputBaseUrl": "https://cdn.example.com"}"#,
        )
        .unwrap();
        let id = store.enqueue(&request).unwrap();
        let store = Arc::new(Mutex::new(store));

        let reporter = ProgressReporter::new(id, Arc::new(StoreProgressSink::new(store.clone())));
        reporter.report(Stage::Finalizing, 0, 0, None, 250).await;

        let job = store.lock().unwrap().get_job(id).unwrap();
        assert_eq!(job.progress.unwrap().percent, 100);
    }
}
