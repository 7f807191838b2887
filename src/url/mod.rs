//! URL handling: canonicalization, path structure, and host checks
//!
//! Every URL entering the crawl is canonicalized before any dedup check or
//! map lookup; the canonical string is the identity key for a page.

mod canonical;

pub use canonical::{
    canonicalize_str, canonicalize_url, parent_url, path_depth, resolve_link, same_host,
};
