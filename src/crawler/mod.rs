//! Crawl orchestration
//!
//! [`CrawlEngine`] owns one crawl job's execution: the frontier of admitted
//! URLs, the politeness delays between navigations, the page budget, and
//! final manifest assembly. The per-URL work (visit, slice, persist,
//! discover) lives in the pipeline.

mod engine;
mod pipeline;

pub use engine::{CrawlEngine, CrawlOutcome};
pub use pipeline::{process_page, PageOutcome};
