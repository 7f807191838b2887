//! HTML parsing for visited pages
//!
//! Pulls the title and candidate links out of a rendered page's HTML.
//! Links come back resolved against the page URL and canonicalized;
//! schemes that cannot be crawled (javascript:, mailto:, tel:, data:)
//! are dropped here.

use crate::url::resolve_link;
use scraper::{Html, Selector};
use url::Url;

/// Extracted information from a rendered page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    pub title: Option<String>,
    pub links: Vec<Url>,
}

/// Parses rendered HTML and extracts the title and links
pub fn parse_page(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, base_url),
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            // download links point at files, not pages
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(resolved) = resolve_link(href, base_url) {
                    links.push(resolved);
                }
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/").unwrap()
    }

    #[test]
    fn test_extract_title() {
        let parsed = parse_page(
            "<html><head><title>  Docs  </title></head><body></body></html>",
            &base(),
        );
        assert_eq!(parsed.title, Some("Docs".to_string()));
    }

    #[test]
    fn test_missing_title() {
        let parsed = parse_page("<html><body>hi</body></html>", &base());
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_relative_links_resolved() {
        let html = r#"<a href="intro">Intro</a> <a href="/pricing">Pricing</a>"#;
        let parsed = parse_page(html, &base());
        let urls: Vec<&str> = parsed.links.iter().map(Url::as_str).collect();
        assert_eq!(
            urls,
            vec!["https://example.com/docs/intro", "https://example.com/pricing"]
        );
    }

    #[test]
    fn test_uncrawlable_schemes_dropped() {
        let html = r#"
            <a href="mailto:x@example.com">mail</a>
            <a href="javascript:void(0)">js</a>
            <a href="tel:+1555">call</a>
            <a href="/ok">ok</a>
        "#;
        let parsed = parse_page(html, &base());
        assert_eq!(parsed.links.len(), 1);
        assert_eq!(parsed.links[0].as_str(), "https://example.com/ok");
    }

    #[test]
    fn test_download_links_skipped() {
        let html = r#"<a href="/report" download>get</a><a href="/page">page</a>"#;
        let parsed = parse_page(html, &base());
        assert_eq!(parsed.links.len(), 1);
        assert_eq!(parsed.links[0].as_str(), "https://example.com/page");
    }
}
