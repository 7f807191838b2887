use crate::UrlError;
use url::Url;

/// Canonicalizes a URL string
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than http/https
/// 3. Lowercase the host
/// 4. Normalize the path: remove dot segments and duplicate slashes,
///    strip the trailing slash (except for the root `/`)
/// 5. Remove the fragment
/// 6. Remove an empty query string
///
/// The resulting serialized string is the page's identity key for
/// deduplication and map lookups.
///
/// # Arguments
///
/// * `url_str` - The URL string to canonicalize
///
/// # Returns
///
/// * `Ok(Url)` - Canonical URL
/// * `Err(UrlError)` - Failed to parse or canonicalize the URL
pub fn canonicalize_str(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize_url(&url)
}

/// Canonicalizes an already-parsed URL (see [`canonicalize_str`])
pub fn canonicalize_url(url: &Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let mut url = url.clone();

    match url.host_str() {
        Some(host) => {
            let lowered = host.to_lowercase();
            url.set_host(Some(&lowered))
                .map_err(|e| UrlError::Parse(e.to_string()))?;
        }
        None => return Err(UrlError::MissingHost),
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// Resolves a link href against a base URL and canonicalizes it
///
/// Returns None for hrefs that cannot form a crawlable page URL:
/// unparseable values and non-http(s) schemes (`javascript:`, `mailto:`,
/// `tel:`, data URIs).
pub fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let joined = base.join(href).ok()?;
    canonicalize_url(&joined).ok()
}

/// Counts the non-empty path segments of a URL
///
/// The origin itself has depth 0; `https://example.com/a/b` has depth 2.
pub fn path_depth(url: &Url) -> u32 {
    match url.path_segments() {
        Some(segments) => segments.filter(|s| !s.is_empty()).count() as u32,
        None => 0,
    }
}

/// Checks whether two URLs share the same hostname
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(ha), Some(hb)) => ha.eq_ignore_ascii_case(hb),
        _ => false,
    }
}

/// Derives the candidate parent URL by truncating the last path segment
///
/// The query and fragment are dropped; a root-path URL stays at `/`.
/// This is a pure function of URL path structure and ignores the actual
/// hyperlink graph.
pub fn parent_url(url: &Url) -> Url {
    let mut parent = url.clone();
    parent.set_query(None);
    parent.set_fragment(None);

    let segments: Vec<&str> = match url.path_segments() {
        Some(s) => s.filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    };

    if segments.len() <= 1 {
        parent.set_path("/");
    } else {
        let truncated = format!("/{}", segments[..segments.len() - 1].join("/"));
        parent.set_path(&truncated);
    }

    parent
}

/// Normalizes a URL path: drops dot segments and empty segments, strips
/// the trailing slash unless the path is the root
fn normalize_path(path: &str) -> String {
    let mut normalized: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                normalized.pop();
            }
            _ => normalized.push(segment),
        }
    }

    if normalized.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", normalized.join("/"))
    }
}
