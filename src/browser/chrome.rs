//! chromiumoxide-backed page automation
//!
//! One [`ChromeAutomation`] instance owns one headless Chrome for the
//! lifetime of one crawl job. Pages are opened per URL and closed after
//! every visit; session state (cookies, login) lives in the shared browser
//! context.

use crate::browser::{auth, parser, stabilize, CapturedPage, PageAutomation};
use crate::config::{AuthSession, BrowserSettings, CrawlConfiguration};
use crate::url::canonicalize_url;
use crate::{JobError, PageError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// Hard ceiling on a single navigation
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Hard ceiling on one page's whole visit (navigate through capture)
const PAGE_TIMEOUT: Duration = Duration::from_secs(45);

/// Navigation attempts before a page is given up
const NAVIGATION_ATTEMPTS: u32 = 3;

/// Production automation on top of a headless Chrome
pub struct ChromeAutomation {
    browser: Browser,
    handler_task: JoinHandle<()>,
    post_load_delay: Duration,
}

impl ChromeAutomation {
    /// Launches a browser configured for this crawl
    pub async fn launch(
        settings: &BrowserSettings,
        config: &CrawlConfiguration,
    ) -> Result<Self, JobError> {
        let viewport = Viewport {
            width: settings.viewport_width,
            height: settings.viewport_height,
            device_scale_factor: Some(config.device_scale_factor),
            ..Viewport::default()
        };

        let mut builder = BrowserConfig::builder()
            .viewport(viewport)
            .window_size(settings.viewport_width, settings.viewport_height);
        if let Some(executable) = &settings.executable {
            builder = builder.chrome_executable(executable);
        }
        let browser_config = builder.build().map_err(JobError::Browser)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| JobError::Browser(e.to_string()))?;

        // The handler stream must be pumped for the browser connection to
        // make progress; it ends when the browser goes away.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            post_load_delay: Duration::from_millis(config.post_load_delay_ms),
        })
    }

    /// Navigates a page with bounded, retried attempts
    async fn navigate(&self, page: &Page, url: &Url) -> Result<(), PageError> {
        let mut last_error = String::new();

        for attempt in 1..=NAVIGATION_ATTEMPTS {
            let outcome = tokio::time::timeout(NAVIGATION_TIMEOUT, async {
                page.goto(url.as_str()).await?;
                page.wait_for_navigation().await?;
                Ok::<_, chromiumoxide::error::CdpError>(())
            })
            .await;

            match outcome {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => last_error = format!("timed out after {NAVIGATION_TIMEOUT:?}"),
            }

            tracing::warn!(
                %url,
                attempt,
                error = %last_error,
                "navigation attempt failed"
            );
            if attempt < NAVIGATION_ATTEMPTS {
                tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
            }
        }

        Err(PageError::Navigation {
            url: url.to_string(),
            attempts: NAVIGATION_ATTEMPTS,
            message: last_error,
        })
    }

    /// The visit body; runs under [`PAGE_TIMEOUT`]
    async fn visit_inner(&self, page: &Page, url: &Url) -> Result<CapturedPage, PageError> {
        self.navigate(page, url).await?;

        stabilize::stabilize(page, self.post_load_delay).await;

        let screenshot = page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await
            .map_err(|e| PageError::Capture {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .and_then(|u| Url::parse(&u).ok())
            .and_then(|u| canonicalize_url(&u).ok())
            .unwrap_or_else(|| url.clone());

        let title = page.get_title().await.ok().flatten();

        let html = page.content().await.unwrap_or_default();
        let parsed = parser::parse_page(&html, &final_url);

        Ok(CapturedPage {
            url: final_url,
            title: title.or(parsed.title),
            screenshot,
            links: parsed.links,
        })
    }
}

#[async_trait]
impl PageAutomation for ChromeAutomation {
    async fn bootstrap_auth(
        &mut self,
        auth: &AuthSession,
        start_url: &Url,
    ) -> Result<(), PageError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| PageError::Authentication(e.to_string()))?;

        let result = match auth {
            AuthSession::Cookies(cookies) => {
                auth::inject_cookies(&page, cookies, start_url).await
            }
            AuthSession::Credentials(creds) => {
                auth::login_with_credentials(&page, creds).await
            }
        };

        if let Err(e) = page.close().await {
            tracing::debug!("auth page close failed: {e}");
        }

        result
    }

    async fn visit(&mut self, url: &Url) -> Result<CapturedPage, PageError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| PageError::Navigation {
                url: url.to_string(),
                attempts: 0,
                message: format!("page creation failed: {e}"),
            })?;

        let result = match tokio::time::timeout(PAGE_TIMEOUT, self.visit_inner(&page, url)).await
        {
            Ok(result) => result,
            Err(_) => Err(PageError::Navigation {
                url: url.to_string(),
                attempts: NAVIGATION_ATTEMPTS,
                message: format!("page handler exceeded {PAGE_TIMEOUT:?}"),
            }),
        };

        if let Err(e) = page.close().await {
            tracing::debug!(%url, "page close failed: {e}");
        }

        result
    }

    async fn shutdown(&mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("browser close failed: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("browser wait failed: {e}");
        }
        self.handler_task.abort();
    }
}
