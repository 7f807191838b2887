//! Admission and link-filtering policy
//!
//! Policy is kept data-driven and separate from the engine so it can be
//! tested and extended on its own:
//!
//! - `LanguageDetector`: swappable strategy for reading a language code out
//!   of a URL (path prefix, query parameter, or subdomain)
//! - section keys: coarse grouping by first meaningful path segment
//! - `AdmissionPolicy`: the ordered, short-circuiting filter chain applied
//!   to every discovered URL
//! - `LinkBlocklist`: ordered regex rules applied to links before they ever
//!   reach the admission chain

mod admission;
mod blocklist;
mod language;
mod section;

pub use admission::{AdmissionPolicy, RejectReason, Verdict};
pub use blocklist::LinkBlocklist;
pub use language::{detect_default_language, KnownCodesDetector, LanguageDetector};
pub use section::section_key;
