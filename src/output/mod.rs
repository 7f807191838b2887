//! Crawl output: page records, the site tree, and the manifest
//!
//! Everything here is pure assembly over the records captured during the
//! crawl; no I/O happens in this module (persistence lives in
//! `capture::ArtifactWriter`).

mod manifest;
mod tree;

pub use manifest::Manifest;
pub use tree::{build_site_tree, PageRecord, SiteTreeNode};
