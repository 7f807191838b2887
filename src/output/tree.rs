//! Site tree reconstruction
//!
//! Builds a rooted hierarchy from the flat set of captured pages using URL
//! path structure alone: each page's candidate parent is its URL with the
//! last path segment truncated. The actual hyperlink graph plays no part,
//! which keeps the result deterministic for identical inputs.

use crate::url::{canonicalize_str, parent_url};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One captured page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRecord {
    /// Canonical page URL
    pub url: String,

    /// Page title, when one was present
    pub title: Option<String>,

    /// Ordered public URLs of the page's screenshot slices
    pub screenshots: Vec<String>,
}

/// A node of the reconstructed site hierarchy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteTreeNode {
    #[serde(flatten)]
    pub page: PageRecord,

    /// Children in discovery order
    pub children: Vec<SiteTreeNode>,
}

/// Builds the site tree from the full page set
///
/// The node whose canonical URL equals the canonical start URL becomes the
/// root. Every other node attaches to the node at its truncated-path parent
/// URL; when no such node exists it attaches directly under the root and an
/// orphan warning is logged. Returns None for an empty input.
///
/// If the start URL itself has no record (the start page was dropped
/// mid-crawl), the first record in input order stands in as the root.
pub fn build_site_tree(pages: &[PageRecord], start_url: &str) -> Option<SiteTreeNode> {
    if pages.is_empty() {
        return None;
    }

    let canonical_start = canonicalize_str(start_url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| start_url.to_string());

    // Index every page by canonical URL. Input order is kept for
    // deterministic child ordering.
    let mut by_url: HashMap<String, usize> = HashMap::with_capacity(pages.len());
    for (i, page) in pages.iter().enumerate() {
        by_url.entry(page.url.clone()).or_insert(i);
    }

    let root_idx = match by_url.get(&canonical_start) {
        Some(&i) => i,
        None => {
            tracing::warn!(
                start_url = %canonical_start,
                fallback = %pages[0].url,
                "no page record for start URL, using first record as root"
            );
            0
        }
    };

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); pages.len()];

    for (i, page) in pages.iter().enumerate() {
        if i == root_idx {
            continue;
        }

        let parent_idx = canonicalize_str(&page.url)
            .ok()
            .map(|u| parent_url(&u).to_string())
            .and_then(|parent| {
                // A page whose truncated parent is itself (root-path pages)
                // has no structural parent.
                if parent == page.url {
                    None
                } else {
                    by_url.get(&parent).copied()
                }
            })
            .filter(|&p| p != i);

        match parent_idx {
            Some(p) => children[p].push(i),
            None => {
                tracing::warn!(url = %page.url, "orphan page attached under root");
                children[root_idx].push(i);
            }
        }
    }

    Some(assemble(root_idx, pages, &children))
}

/// Recursively materializes the node for `idx`
fn assemble(idx: usize, pages: &[PageRecord], children: &[Vec<usize>]) -> SiteTreeNode {
    SiteTreeNode {
        page: pages[idx].clone(),
        children: children[idx]
            .iter()
            .map(|&c| assemble(c, pages, children))
            .collect(),
    }
}
