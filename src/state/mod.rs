//! Engine-local crawl state
//!
//! One [`CrawlSession`] value exists per crawl job. It is owned by the
//! engine and threaded through the admission chain by mutable reference:
//! single writer, no locking, never persisted.

mod session;

pub use session::CrawlSession;
