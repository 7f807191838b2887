//! Durable job queue and worker
//!
//! Crawl requests become rows in a SQLite-backed queue. A worker claims one
//! job at a time, runs the crawl engine against it, and records exactly one
//! terminal status. Multiple worker processes may share the same queue
//! database; the claim is a compare-and-set so a job is never executed
//! twice.

mod job;
mod store;
mod worker;

pub use job::{CrawlJob, JobStatus, ProgressSnapshot};
pub use store::SqliteJobStore;
pub use worker::Worker;
