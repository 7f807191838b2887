//! SQLite-backed job store
//!
//! One table holds the whole job lifecycle: the enqueue payload, the
//! claim, the overwritten progress snapshot, and the terminal result.

use crate::config::{validate_request, CrawlConfiguration, CrawlRequest};
use crate::queue::{CrawlJob, JobStatus, ProgressSnapshot};
use crate::{LensError, QueueError, QueueResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite job store
pub struct SqliteJobStore {
    conn: Connection,
}

impl SqliteJobStore {
    /// Opens (or creates) the queue database
    pub fn new(path: &Path) -> QueueResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory store (for testing)
    pub fn new_in_memory() -> QueueResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Validates a crawl request and enqueues it
    ///
    /// A payload that fails validation is rejected synchronously and no
    /// job row is created. Returns the new job id.
    pub fn enqueue(&mut self, request: &CrawlRequest) -> Result<i64, LensError> {
        validate_request(request)?;

        let config = request.configuration();
        let config_json = serde_json::to_string(&config).map_err(QueueError::from)?;
        let now = Utc::now().to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO jobs (target_url, output_base_url, config_json, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    request.url,
                    request.output_base_url,
                    config_json,
                    JobStatus::Pending.to_db_string(),
                    now
                ],
            )
            .map_err(QueueError::from)?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Claims the oldest pending job, transitioning it to `active`
    ///
    /// The transition is a compare-and-set on the status column, so two
    /// workers sharing the database cannot claim the same job.
    pub fn claim_next(&mut self) -> QueueResult<Option<CrawlJob>> {
        loop {
            let candidate: Option<i64> = self
                .conn
                .query_row(
                    "SELECT id FROM jobs WHERE status = 'pending' ORDER BY id LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;

            let id = match candidate {
                Some(id) => id,
                None => return Ok(None),
            };

            let now = Utc::now().to_rfc3339();
            let claimed = self.conn.execute(
                "UPDATE jobs SET status = 'active', started_at = ?1
                 WHERE id = ?2 AND status = 'pending'",
                params![now, id],
            )?;

            if claimed == 1 {
                return Ok(Some(self.get_job(id)?));
            }
            // Another worker won the race; try the next candidate.
        }
    }

    /// Loads a job by id
    pub fn get_job(&self, id: i64) -> QueueResult<CrawlJob> {
        let mut stmt = self.conn.prepare(
            "SELECT id, target_url, output_base_url, config_json, status, progress_json,
                    error_message, manifest_url, created_at, started_at, finished_at
             FROM jobs WHERE id = ?1",
        )?;

        let row = stmt
            .query_row(params![id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, Option<String>>(9)?,
                    row.get::<_, Option<String>>(10)?,
                ))
            })
            .optional()?
            .ok_or(QueueError::JobNotFound(id))?;

        let configuration: CrawlConfiguration = serde_json::from_str(&row.3)?;
        let progress = match row.5 {
            Some(json) => Some(serde_json::from_str::<ProgressSnapshot>(&json)?),
            None => None,
        };

        Ok(CrawlJob {
            id: row.0,
            target_url: row.1,
            output_base_url: row.2,
            configuration,
            status: JobStatus::from_db_string(&row.4).unwrap_or(JobStatus::Failed),
            progress,
            error_message: row.6,
            manifest_url: row.7,
            created_at: row.8,
            started_at: row.9,
            finished_at: row.10,
        })
    }

    /// Overwrites the job's progress snapshot
    pub fn update_progress(&mut self, id: i64, snapshot: &ProgressSnapshot) -> QueueResult<()> {
        let json = serde_json::to_string(snapshot)?;
        let updated = self.conn.execute(
            "UPDATE jobs SET progress_json = ?1 WHERE id = ?2",
            params![json, id],
        )?;
        if updated == 0 {
            return Err(QueueError::JobNotFound(id));
        }
        Ok(())
    }

    /// Marks a job completed with its manifest URL
    pub fn mark_completed(&mut self, id: i64, manifest_url: &str) -> QueueResult<()> {
        self.finish(id, JobStatus::Completed, Some(manifest_url), None)
    }

    /// Marks a job failed with the captured error
    pub fn mark_failed(&mut self, id: i64, error: &str) -> QueueResult<()> {
        self.finish(id, JobStatus::Failed, None, Some(error))
    }

    /// Applies a terminal transition exactly once
    ///
    /// Authentication material is scrubbed from the stored configuration at
    /// the same time; credentials never outlive the job.
    fn finish(
        &mut self,
        id: i64,
        status: JobStatus,
        manifest_url: Option<&str>,
        error: Option<&str>,
    ) -> QueueResult<()> {
        let current = self.get_job(id)?;
        if current.status.is_terminal() {
            return Err(QueueError::InvalidTransition {
                from: current.status.to_db_string().to_string(),
                to: status.to_db_string().to_string(),
            });
        }

        let mut scrubbed = current.configuration.clone();
        scrubbed.auth = None;
        let config_json = serde_json::to_string(&scrubbed)?;

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE jobs SET status = ?1, manifest_url = ?2, error_message = ?3,
                             config_json = ?4, finished_at = ?5
             WHERE id = ?6",
            params![
                status.to_db_string(),
                manifest_url,
                error,
                config_json,
                now,
                id
            ],
        )?;
        Ok(())
    }

    /// Number of jobs currently pending
    pub fn pending_count(&self) -> QueueResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE status = 'pending'",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS jobs (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            target_url      TEXT NOT NULL,
            output_base_url TEXT NOT NULL,
            config_json     TEXT NOT NULL,
            status          TEXT NOT NULL,
            progress_json   TEXT,
            error_message   TEXT,
            manifest_url    TEXT,
            created_at      TEXT NOT NULL,
            started_at      TEXT,
            finished_at     TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs (status, id);
    ",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthSession;

    fn request(url: &str) -> CrawlRequest {
        serde_json::from_str(&format!(
            r#"{{"url": "{url}", "outputBaseUrl": "https://cdn.example.com/out"}}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_enqueue_and_get() {
        let mut store = SqliteJobStore::new_in_memory().unwrap();
        let id = store.enqueue(&request("https://example.com")).unwrap();

        let job = store.get_job(id).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.target_url, "https://example.com");
        assert!(job.progress.is_none());
        assert!(job.manifest_url.is_none());
    }

    #[test]
    fn test_invalid_request_creates_no_job() {
        let mut store = SqliteJobStore::new_in_memory().unwrap();
        let mut bad = request("https://example.com");
        bad.url = String::new();

        assert!(store.enqueue(&bad).is_err());
        assert_eq!(store.pending_count().unwrap(), 0);
    }

    #[test]
    fn test_claim_oldest_first() {
        let mut store = SqliteJobStore::new_in_memory().unwrap();
        let first = store.enqueue(&request("https://a.example.com")).unwrap();
        let second = store.enqueue(&request("https://b.example.com")).unwrap();

        let claimed = store.claim_next().unwrap().unwrap();
        assert_eq!(claimed.id, first);
        assert_eq!(claimed.status, JobStatus::Active);
        assert!(claimed.started_at.is_some());

        let claimed = store.claim_next().unwrap().unwrap();
        assert_eq!(claimed.id, second);

        assert!(store.claim_next().unwrap().is_none());
    }

    #[test]
    fn test_progress_overwrite() {
        let mut store = SqliteJobStore::new_in_memory().unwrap();
        let id = store.enqueue(&request("https://example.com")).unwrap();

        let first = ProgressSnapshot {
            stage: "crawling".to_string(),
            current_page: 1,
            total_pages: 5,
            current_url: Some("https://example.com/".to_string()),
            percent: 20,
        };
        store.update_progress(id, &first).unwrap();

        let second = ProgressSnapshot {
            stage: "crawling".to_string(),
            current_page: 3,
            total_pages: 5,
            current_url: Some("https://example.com/b".to_string()),
            percent: 60,
        };
        store.update_progress(id, &second).unwrap();

        let job = store.get_job(id).unwrap();
        assert_eq!(job.progress, Some(second));
    }

    #[test]
    fn test_terminal_exactly_once() {
        let mut store = SqliteJobStore::new_in_memory().unwrap();
        let id = store.enqueue(&request("https://example.com")).unwrap();
        store.claim_next().unwrap().unwrap();

        store
            .mark_completed(id, "https://cdn.example.com/out/manifests/manifest_1.json")
            .unwrap();

        let job = store.get_job(id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.finished_at.is_some());

        // A second terminal transition is rejected
        assert!(matches!(
            store.mark_failed(id, "boom"),
            Err(QueueError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_auth_scrubbed_on_terminal() {
        let mut store = SqliteJobStore::new_in_memory().unwrap();
        let mut req = request("https://example.com");
        req.auth = Some(AuthSession::Cookies(vec![crate::config::AuthCookie {
            name: "sid".to_string(),
            value: "secret".to_string(),
        }]));

        let id = store.enqueue(&req).unwrap();
        assert!(store.get_job(id).unwrap().configuration.auth.is_some());

        store.claim_next().unwrap().unwrap();
        store.mark_failed(id, "browser died").unwrap();

        let job = store.get_job(id).unwrap();
        assert!(job.configuration.auth.is_none());
        assert_eq!(job.error_message.as_deref(), Some("browser died"));
    }

    #[test]
    fn test_missing_job() {
        let store = SqliteJobStore::new_in_memory().unwrap();
        assert!(matches!(
            store.get_job(42),
            Err(QueueError::JobNotFound(42))
        ));
    }
}
