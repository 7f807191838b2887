//! The crawl manifest
//!
//! One manifest exists per successful crawl job. It is assembled after the
//! crawl loop finishes and written exactly once; a failed job never leaves
//! a partial manifest behind.

use crate::output::SiteTreeNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The durable artifact describing one crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// The crawl's start URL, as requested
    pub start_url: String,

    /// When the manifest was assembled
    pub crawl_date: DateTime<Utc>,

    /// The reconstructed page hierarchy; None when no page was captured
    pub tree: Option<SiteTreeNode>,
}
