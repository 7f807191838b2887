//! Per-URL pipeline
//!
//! One admitted URL flows through: navigate -> stabilize -> capture (all
//! inside the automation layer) -> slice -> persist -> record -> discover.
//! A failure anywhere drops this page and nothing else; the caller keeps
//! crawling.

use crate::browser::PageAutomation;
use crate::capture::ArtifactWriter;
use crate::output::PageRecord;
use crate::PageError;
use url::Url;

/// The result of pushing one URL through the pipeline
#[derive(Debug)]
pub struct PageOutcome {
    /// The finished record, keyed by the admitted canonical URL
    pub record: PageRecord,

    /// Links discovered on the page, resolved and canonicalized
    pub links: Vec<Url>,
}

/// Visits one admitted URL and produces its record and discovered links
///
/// The record is keyed by the admitted canonical URL - the crawl's identity
/// for the page - even when the browser lands on a redirected final URL.
pub async fn process_page<A: PageAutomation + ?Sized>(
    automation: &mut A,
    artifacts: &ArtifactWriter,
    url: &Url,
) -> Result<PageOutcome, PageError> {
    let captured = automation.visit(url).await?;

    let screenshots = artifacts.write_screenshots(url, &captured.screenshot)?;

    let record = PageRecord {
        url: url.to_string(),
        title: captured.title,
        screenshots,
    };

    tracing::info!(
        url = %record.url,
        title = record.title.as_deref().unwrap_or("-"),
        slices = record.screenshots.len(),
        links = captured.links.len(),
        "page captured"
    );

    Ok(PageOutcome {
        record,
        links: captured.links,
    })
}
