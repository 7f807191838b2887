//! Artifact persistence: screenshot tiles and their public URLs
//!
//! Tiles land under `<root>/screenshots/`, manifests under
//! `<root>/manifests/`; public URLs are the same filenames joined onto the
//! job's output base URL.

use crate::capture::slicer::slice_screenshot;
use crate::output::Manifest;
use crate::{JobError, PageError};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Longest filename stem kept before truncation
const MAX_STEM_LEN: usize = 120;

/// Writes crawl artifacts for one job
pub struct ArtifactWriter {
    screenshot_dir: PathBuf,
    manifest_dir: PathBuf,
    output_base_url: String,
}

impl ArtifactWriter {
    /// Creates the writer and its output directories
    pub fn new(root: &Path, output_base_url: &str) -> std::io::Result<Self> {
        let screenshot_dir = root.join("screenshots");
        let manifest_dir = root.join("manifests");
        fs::create_dir_all(&screenshot_dir)?;
        fs::create_dir_all(&manifest_dir)?;

        Ok(Self {
            screenshot_dir,
            manifest_dir,
            output_base_url: output_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Slices a full-page capture and persists every tile
    ///
    /// Returns the public tile URLs in order. Filenames carry the sanitized
    /// URL stem, plus `_slice_{i}_of_{n}` when the capture was cut.
    pub fn write_screenshots(&self, page_url: &Url, png: &[u8]) -> Result<Vec<String>, PageError> {
        let tiles = slice_screenshot(page_url.as_str(), png)?;
        let stem = sanitize_stem(page_url);
        let total = tiles.len();

        let mut urls = Vec::with_capacity(total);
        for (i, buffer) in tiles.iter().enumerate() {
            let filename = if total == 1 {
                format!("{stem}.png")
            } else {
                format!("{stem}_slice_{}_of_{}.png", i + 1, total)
            };

            let path = self.screenshot_dir.join(&filename);
            fs::write(&path, buffer).map_err(|source| PageError::Artifact {
                url: page_url.to_string(),
                source,
            })?;

            urls.push(format!("{}/screenshots/{filename}", self.output_base_url));
        }

        tracing::debug!(url = %page_url, tiles = total, "screenshots persisted");
        Ok(urls)
    }

    /// Writes the manifest atomically and returns (path, public URL)
    ///
    /// The JSON is written to a temp file in the manifest directory and
    /// renamed into place, so a partially-written manifest is never visible
    /// under its final name.
    pub fn write_manifest(
        &self,
        job_id: i64,
        manifest: &Manifest,
    ) -> Result<(PathBuf, String), JobError> {
        let filename = format!("manifest_{job_id}.json");
        let path = self.manifest_dir.join(&filename);
        let tmp_path = self.manifest_dir.join(format!("{filename}.tmp"));

        let body = serde_json::to_vec_pretty(manifest)?;
        fs::write(&tmp_path, body)?;
        fs::rename(&tmp_path, &path)?;

        let url = format!("{}/manifests/{filename}", self.output_base_url);
        tracing::info!(%url, "manifest written");
        Ok((path, url))
    }
}

/// Turns a page URL into a filesystem-safe filename stem
///
/// Host and path survive as words joined by underscores; anything outside
/// `[A-Za-z0-9._-]` is replaced, runs are collapsed, and the stem is capped
/// at a fixed length.
fn sanitize_stem(url: &Url) -> String {
    let host = url.host_str().unwrap_or("page");
    let raw = format!("{host}{}", url.path());

    let mut stem = String::with_capacity(raw.len());
    let mut last_was_sep = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            stem.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            stem.push('_');
            last_was_sep = true;
        }
    }

    let stem = stem.trim_matches('_').to_string();
    if stem.len() > MAX_STEM_LEN {
        stem[..MAX_STEM_LEN].trim_end_matches('_').to_string()
    } else if stem.is_empty() {
        "page".to_string()
    } else {
        stem
    }
}
