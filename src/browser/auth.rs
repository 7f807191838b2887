//! Authentication bootstrap
//!
//! Runs once per crawl, before the first content navigation. Cookie auth
//! injects the provided cookies scoped to the start URL; credential auth
//! drives a heuristic login flow on the configured login page. Failures
//! here never kill the job - the crawl proceeds unauthenticated.

use crate::config::{AuthCookie, Credentials};
use crate::PageError;
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::Page;
use std::time::Duration;
use url::Url;

/// Selectors tried in order to find the username/email field
const USERNAME_SELECTORS: &[&str] = &[
    "input[type='email']",
    "input[name*='email' i]",
    "input[name*='user' i]",
    "input[id*='email' i]",
    "input[id*='user' i]",
    "input[type='text']",
];

/// Selectors tried in order to find the submit control
const SUBMIT_SELECTORS: &[&str] = &[
    "button[type='submit']",
    "input[type='submit']",
    "form button",
];

/// Elements whose presence suggests a signed-in session
const SUCCESS_INDICATOR_JS: &str = r#"
!!document.querySelector(
    "a[href*='logout' i], a[href*='signout' i], a[href*='sign-out' i], " +
    "a[href*='account' i], a[href*='profile' i], [class*='avatar' i]"
)
"#;

/// Injects session cookies scoped to the start URL's domain
pub async fn inject_cookies(
    page: &Page,
    cookies: &[AuthCookie],
    start_url: &Url,
) -> Result<(), PageError> {
    let mut params = Vec::with_capacity(cookies.len());
    for cookie in cookies {
        let param = CookieParam::builder()
            .name(cookie.name.as_str())
            .value(cookie.value.as_str())
            .url(start_url.as_str())
            .build()
            .map_err(PageError::Authentication)?;
        params.push(param);
    }

    page.set_cookies(params)
        .await
        .map_err(|e| PageError::Authentication(e.to_string()))?;

    tracing::info!(count = cookies.len(), "session cookies injected");
    Ok(())
}

/// Performs a heuristic login with the provided credentials
///
/// Navigates to the login URL, fills the first plausible username and
/// password inputs, clicks the first plausible submit control, waits for
/// the post-submit settle, and checks for a signed-in indicator.
pub async fn login_with_credentials(page: &Page, creds: &Credentials) -> Result<(), PageError> {
    page.goto(creds.login_url.as_str())
        .await
        .map_err(|e| PageError::Authentication(format!("login page navigation: {e}")))?;
    page.wait_for_navigation()
        .await
        .map_err(|e| PageError::Authentication(format!("login page load: {e}")))?;

    let username_field = find_first(page, USERNAME_SELECTORS)
        .await
        .ok_or_else(|| PageError::Authentication("no username field found".to_string()))?;
    username_field
        .click()
        .await
        .map_err(|e| PageError::Authentication(e.to_string()))?;
    username_field
        .type_str(&creds.username)
        .await
        .map_err(|e| PageError::Authentication(e.to_string()))?;

    let password_field = page
        .find_element("input[type='password']")
        .await
        .map_err(|_| PageError::Authentication("no password field found".to_string()))?;
    password_field
        .click()
        .await
        .map_err(|e| PageError::Authentication(e.to_string()))?;
    password_field
        .type_str(&creds.password)
        .await
        .map_err(|e| PageError::Authentication(e.to_string()))?;

    let submit = find_first(page, SUBMIT_SELECTORS)
        .await
        .ok_or_else(|| PageError::Authentication("no submit control found".to_string()))?;
    submit
        .click()
        .await
        .map_err(|e| PageError::Authentication(e.to_string()))?;

    // Let the post-submit requests settle; some sites redirect, some swap
    // the DOM in place.
    let _ = tokio::time::timeout(Duration::from_secs(10), page.wait_for_navigation()).await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    let authenticated = page
        .evaluate(SUCCESS_INDICATOR_JS)
        .await
        .ok()
        .and_then(|r| r.into_value::<bool>().ok())
        .unwrap_or(false);

    if authenticated {
        tracing::info!("credential login succeeded");
        Ok(())
    } else {
        Err(PageError::Authentication(
            "no signed-in indicator after login submit".to_string(),
        ))
    }
}

/// Returns the first element matching any of the selectors, in order
async fn find_first(
    page: &Page,
    selectors: &[&str],
) -> Option<chromiumoxide::element::Element> {
    for selector in selectors {
        if let Ok(element) = page.find_element(*selector).await {
            return Some(element);
        }
    }
    None
}
