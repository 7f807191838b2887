//! Page stabilization before capture
//!
//! A freshly-loaded page is rarely ready to screenshot: requests are still
//! settling, lazy-loaded content sits below the fold, and sticky headers
//! duplicate themselves across a full-page capture. Stabilization runs the
//! same sequence on every page: bounded readiness wait, optional extra
//! delay, sticky-element cleanup, a full-height scroll to trigger lazy
//! loading, and a multi-mechanism scroll reset.

use chromiumoxide::Page;
use std::time::Duration;

/// Bounded wait for document readiness; exceeding it is not a failure
pub const READINESS_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between scroll increments while triggering lazy loads
const SCROLL_STEP_PAUSE: Duration = Duration::from_millis(150);

/// Hides every fixed/sticky element except the first
///
/// Full-page captures replicate sticky navigation bars once per viewport;
/// keeping only the first occurrence preserves the real header.
const HIDE_EXTRA_STICKY_JS: &str = r#"
(() => {
    const sticky = [];
    for (const el of document.querySelectorAll('body *')) {
        const position = getComputedStyle(el).position;
        if (position === 'fixed' || position === 'sticky') {
            sticky.push(el);
        }
    }
    for (const el of sticky.slice(1)) {
        el.style.setProperty('visibility', 'hidden', 'important');
    }
    return sticky.length;
})()
"#;

/// Resets the scroll position through every mechanism sites are known to
/// respond to; scroll containers behave inconsistently across sites
const RESET_SCROLL_JS: &str = r#"
(() => {
    window.scrollTo(0, 0);
    document.documentElement.scrollTop = 0;
    if (document.body) { document.body.scrollTop = 0; }
    if (document.scrollingElement) { document.scrollingElement.scrollTop = 0; }
})()
"#;

/// Runs the full stabilization sequence on a loaded page
pub async fn stabilize(page: &Page, post_load_delay: Duration) {
    wait_for_ready(page).await;

    if !post_load_delay.is_zero() {
        tokio::time::sleep(post_load_delay).await;
    }

    match page.evaluate(HIDE_EXTRA_STICKY_JS).await {
        Ok(result) => {
            let count: i64 = result.into_value().unwrap_or(0);
            if count > 1 {
                tracing::debug!(sticky_elements = count, "hid duplicate sticky elements");
            }
        }
        Err(e) => tracing::debug!("sticky-element cleanup failed: {e}"),
    }

    scroll_full_height(page).await;
}

/// Polls document readiness until complete or the bounded timeout elapses
async fn wait_for_ready(page: &Page) {
    let deadline = tokio::time::Instant::now() + READINESS_TIMEOUT;

    loop {
        let ready = page
            .evaluate("document.readyState")
            .await
            .ok()
            .and_then(|r| r.into_value::<String>().ok())
            .map(|state| state == "complete")
            .unwrap_or(false);

        if ready {
            return;
        }

        if tokio::time::Instant::now() >= deadline {
            tracing::debug!("readiness wait timed out, continuing anyway");
            return;
        }

        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

/// Scrolls through the whole document in viewport-sized increments to
/// trigger lazy-loaded content, then resets the scroll position
async fn scroll_full_height(page: &Page) {
    let total_height = eval_number(page, "document.body ? document.body.scrollHeight : 0").await;
    let viewport_height = eval_number(page, "window.innerHeight").await.max(1.0);

    let mut offset = 0.0;
    while offset < total_height {
        offset += viewport_height;
        let script = format!("window.scrollTo(0, {offset})");
        if page.evaluate(script).await.is_err() {
            break;
        }
        tokio::time::sleep(SCROLL_STEP_PAUSE).await;
    }

    if let Err(e) = page.evaluate(RESET_SCROLL_JS).await {
        tracing::debug!("scroll reset failed: {e}");
    }
    // Give the page one frame to re-render at the top before capture.
    tokio::time::sleep(Duration::from_millis(100)).await;
}

async fn eval_number(page: &Page, script: &str) -> f64 {
    page.evaluate(script)
        .await
        .ok()
        .and_then(|r| r.into_value::<f64>().ok())
        .unwrap_or(0.0)
}
