//! Configuration: per-job crawl requests and worker-level settings
//!
//! A crawl job is configured once at enqueue time by a JSON payload
//! ([`CrawlRequest`]) and never mutated afterwards. The worker process
//! itself is configured by a TOML settings file ([`Settings`]).

mod settings;
mod types;
mod validation;

pub use settings::load_settings;
pub use types::{
    ArtifactSettings, AuthCookie, AuthSession, BrowserSettings, CrawlConfiguration, CrawlRequest,
    Credentials, QueueSettings, Settings,
};
pub use validation::validate_request;
