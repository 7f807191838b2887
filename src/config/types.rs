use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Enqueue payload for a crawl job
///
/// `url` and `output_base_url` are required; everything else falls back to
/// the [`CrawlConfiguration`] defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRequest {
    /// Start URL of the crawl
    pub url: String,

    /// Public base URL under which artifacts will be served
    pub output_base_url: String,

    /// Maximum pages to capture (0 = unlimited)
    #[serde(default)]
    pub max_requests_per_crawl: u32,

    /// Maximum path depth from the origin (0 = unlimited)
    #[serde(default)]
    pub max_depth: u32,

    /// Per-section sample cap (0 = unlimited)
    #[serde(default)]
    pub sample_size: u32,

    /// Restrict the crawl to the start URL's language
    #[serde(default)]
    pub default_language_only: bool,

    /// Extra settle time after page load, in milliseconds
    #[serde(default)]
    pub delay: u64,

    /// Base delay between navigations, in milliseconds
    #[serde(default = "default_request_delay")]
    pub request_delay: u64,

    /// Browser device scale factor
    #[serde(default = "default_device_scale")]
    pub device_scale_factor: f64,

    /// Optional authentication material, consumed once per job
    #[serde(default)]
    pub auth: Option<AuthSession>,
}

fn default_request_delay() -> u64 {
    1000
}

fn default_device_scale() -> f64 {
    1.0
}

impl CrawlRequest {
    /// Extracts the immutable per-job policy bundle
    pub fn configuration(&self) -> CrawlConfiguration {
        CrawlConfiguration {
            max_pages: self.max_requests_per_crawl,
            max_depth: self.max_depth,
            sample_size: self.sample_size,
            default_language_only: self.default_language_only,
            request_delay_ms: self.request_delay,
            post_load_delay_ms: self.delay,
            device_scale_factor: self.device_scale_factor,
            auth: self.auth.clone(),
        }
    }
}

/// Immutable policy bundle for one crawl job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfiguration {
    /// Maximum pages to capture (0 = unlimited)
    pub max_pages: u32,

    /// Maximum path depth from the origin (0 = unlimited)
    pub max_depth: u32,

    /// Per-section sample cap (0 = unlimited)
    pub sample_size: u32,

    /// Restrict the crawl to the start URL's language
    pub default_language_only: bool,

    /// Base delay between navigations, in milliseconds
    pub request_delay_ms: u64,

    /// Extra settle time after page load, in milliseconds
    pub post_load_delay_ms: u64,

    /// Browser device scale factor
    pub device_scale_factor: f64,

    /// Optional authentication material; scrubbed when the job goes terminal
    pub auth: Option<AuthSession>,
}

impl Default for CrawlConfiguration {
    fn default() -> Self {
        Self {
            max_pages: 0,
            max_depth: 0,
            sample_size: 0,
            default_language_only: false,
            request_delay_ms: default_request_delay(),
            post_load_delay_ms: 0,
            device_scale_factor: default_device_scale(),
            auth: None,
        }
    }
}

impl CrawlConfiguration {
    /// Effective requests-per-minute implied by the configured delay
    ///
    /// Each navigation costs the configured delay plus roughly half a
    /// second of overhead, so the cap is `60000 / (delay + 500)`.
    pub fn requests_per_minute(&self) -> u64 {
        60_000 / (self.request_delay_ms + 500)
    }
}

/// Authentication material for a crawl, consumed once at job start
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthSession {
    /// Pre-baked session cookies, scoped to the start URL's domain
    Cookies(Vec<AuthCookie>),

    /// Login-form credentials; the browser performs the login flow
    Credentials(Credentials),
}

/// One session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCookie {
    pub name: String,
    pub value: String,
}

/// Login-form credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub login_url: String,
    pub username: String,
    pub password: String,
}

/// Worker process settings, loaded from a TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub queue: QueueSettings,
    pub artifacts: ArtifactSettings,
    #[serde(default)]
    pub browser: BrowserSettings,
}

/// Durable queue settings
#[derive(Debug, Clone, Deserialize)]
pub struct QueueSettings {
    /// Path to the SQLite queue database
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// How long the worker sleeps when the queue is empty, in milliseconds
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Optional HTTP endpoint receiving progress events; when unset,
    /// progress is written straight into the job row
    #[serde(rename = "progress-endpoint", default)]
    pub progress_endpoint: Option<String>,
}

fn default_poll_interval() -> u64 {
    2000
}

/// Where crawl artifacts land on disk
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactSettings {
    /// Root directory; screenshots and manifests live in subdirectories
    #[serde(rename = "root-dir")]
    pub root_dir: PathBuf,
}

/// Browser automation settings
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// Optional Chrome/Chromium executable override
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Viewport width in CSS pixels
    #[serde(rename = "viewport-width", default = "default_viewport_width")]
    pub viewport_width: u32,

    /// Viewport height in CSS pixels
    #[serde(rename = "viewport-height", default = "default_viewport_height")]
    pub viewport_height: u32,
}

fn default_viewport_width() -> u32 {
    1440
}

fn default_viewport_height() -> u32 {
    900
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
        }
    }
}
