//! Browser automation
//!
//! The crawl engine talks to the browser through the [`PageAutomation`]
//! trait; [`ChromeAutomation`] is the production implementation on top of
//! chromiumoxide. The trait boundary keeps the engine testable without a
//! running Chrome.

mod auth;
mod chrome;
mod parser;
mod stabilize;

pub use chrome::ChromeAutomation;
pub use parser::{parse_page, ParsedPage};

use crate::config::AuthSession;
use crate::PageError;
use async_trait::async_trait;
use url::Url;

/// Everything the pipeline needs from one visited page
#[derive(Debug, Clone)]
pub struct CapturedPage {
    /// Final URL after redirects
    pub url: Url,

    /// Page title, when present
    pub title: Option<String>,

    /// Full-page PNG capture
    pub screenshot: Vec<u8>,

    /// Same-document links, resolved and canonicalized
    pub links: Vec<Url>,
}

/// Automation surface the crawl engine drives
///
/// One implementation instance serves one crawl job; navigation retries
/// happen inside `visit`, so a returned error means the page is lost.
#[async_trait]
pub trait PageAutomation: Send {
    /// Establishes an authenticated browsing context, once, before the
    /// first navigation
    async fn bootstrap_auth(&mut self, auth: &AuthSession, start_url: &Url)
        -> Result<(), PageError>;

    /// Navigates, stabilizes, and captures a single page
    async fn visit(&mut self, url: &Url) -> Result<CapturedPage, PageError>;

    /// Tears the browser down; called once when the crawl ends
    async fn shutdown(&mut self);
}
