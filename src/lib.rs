//! Sitelens: a site crawl & capture engine
//!
//! This crate crawls a website through a real browser, captures a full-page
//! screenshot of every admitted page, slices oversized captures into ordered
//! tiles, and assembles a hierarchical manifest of the site for downstream
//! visualization. Crawl requests are queued durably and executed one at a
//! time by a worker that owns its own browser resources.

pub mod browser;
pub mod capture;
pub mod config;
pub mod crawler;
pub mod output;
pub mod policy;
pub mod progress;
pub mod queue;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for sitelens operations
#[derive(Debug, Error)]
pub enum LensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Job execution error: {0}")]
    Job(#[from] JobError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that reject a crawl request before a job is ever created
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors from the durable job queue
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Job not found: {0}")]
    JobNotFound(i64),

    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that fail an entire crawl job
///
/// Page-level failures are absorbed inside the engine and never reach this
/// type; anything that does reach it marks the job `failed`.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Invalid target URL: {0}")]
    InvalidTarget(#[from] UrlError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest serialization failed: {0}")]
    ManifestSerialize(#[from] serde_json::Error),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

/// Per-page errors, isolated by the crawl engine
///
/// A page that fails with one of these is dropped from the result set and
/// the crawl continues.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Navigation failed for {url} after {attempts} attempts: {message}")]
    Navigation {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("Screenshot capture failed for {url}: {message}")]
    Capture { url: String, message: String },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Artifact write failed for {url}: {source}")]
    Artifact {
        url: String,
        source: std::io::Error,
    },

    #[error("Screenshot decode failed for {url}: {message}")]
    Decode { url: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for sitelens operations
pub type Result<T> = std::result::Result<T, LensError>;

/// Result type alias for queue operations
pub type QueueResult<T> = std::result::Result<T, QueueError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{AuthSession, CrawlConfiguration, CrawlRequest, Settings};
pub use crawler::{CrawlEngine, CrawlOutcome};
pub use output::{build_site_tree, Manifest, PageRecord, SiteTreeNode};
pub use queue::{CrawlJob, JobStatus, SqliteJobStore, Worker};
pub use crate::url::canonicalize_url;
