//! Screenshot tiling
//!
//! Full-page captures of tall pages can exceed what downstream consumers
//! (and some encoders) handle comfortably, so captures taller than
//! [`MAX_TILE_HEIGHT`] are cut into a deterministic sequence of vertical
//! tiles. Consecutive tiles share [`TILE_OVERLAP`] pixels so the viewer has
//! a stitching margin.

use crate::PageError;
use image::GenericImageView;

/// Maximum height of a single tile, in pixels
pub const MAX_TILE_HEIGHT: u32 = 4096;

/// Vertical overlap between consecutive tiles, in pixels
pub const TILE_OVERLAP: u32 = 100;

/// One planned tile: a vertical window into the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileBounds {
    /// Zero-based tile index
    pub index: u32,

    /// Top edge in source-image coordinates
    pub top: u32,

    /// Tile height
    pub height: u32,
}

/// Plans the tile layout for an image of the given height
///
/// Pure and deterministic: the same `(height, max_tile_height, overlap)`
/// always yields the same plan.
///
/// - `height <= max_tile_height`: one tile spanning the whole image
/// - `height <= overlap`: one tile (degenerate guard)
/// - otherwise the image is covered by windows of `max_tile_height` pixels
///   advancing by `max_tile_height - overlap`; the final window is clamped
///   to the image, and if clamping would leave it smaller than `overlap`
///   the window is shifted up to `height - max_tile_height` so every tile
///   except a geometry-forced last one is full height
///
/// Any window that would fall outside the image is skipped and logged; it
/// is never emitted.
pub fn plan_tiles(height: u32, max_tile_height: u32, overlap: u32) -> Vec<TileBounds> {
    if height == 0 {
        return Vec::new();
    }

    if height <= max_tile_height || height <= overlap {
        return vec![TileBounds {
            index: 0,
            top: 0,
            height,
        }];
    }

    // A stride of zero cannot advance; treat the overlap as absent.
    let overlap = if overlap >= max_tile_height { 0 } else { overlap };
    let stride = max_tile_height - overlap;

    let slice_count = ((height - max_tile_height) as f64 / stride as f64).ceil() as u32 + 1;
    let slice_count = slice_count.max(1);

    let mut tiles = Vec::with_capacity(slice_count as usize);
    for i in 0..slice_count {
        let mut top = i * stride;
        let mut tile_height = max_tile_height;

        if i == slice_count - 1 {
            let remaining = height.saturating_sub(top);
            if remaining < overlap {
                top = height - max_tile_height;
            } else {
                tile_height = remaining;
            }
        }

        if top >= height || top + tile_height > height {
            tracing::warn!(
                index = i,
                top,
                tile_height,
                image_height = height,
                "planned tile falls outside image bounds, skipping"
            );
            continue;
        }

        tiles.push(TileBounds {
            index: i,
            top,
            height: tile_height,
        });
    }

    tiles
}

/// Decodes a full-page PNG capture and cuts it into encoded PNG tiles
///
/// Returns the tiles in top-to-bottom order. A capture that fits in one
/// tile comes back as a single buffer re-encoded from the source.
pub fn slice_screenshot(url: &str, png: &[u8]) -> Result<Vec<Vec<u8>>, PageError> {
    let img = image::load_from_memory(png).map_err(|e| PageError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let (width, height) = img.dimensions();
    let plan = plan_tiles(height, MAX_TILE_HEIGHT, TILE_OVERLAP);

    if plan.len() == 1 {
        // Nothing to cut; keep the original buffer byte-for-byte.
        return Ok(vec![png.to_vec()]);
    }

    let mut buffers = Vec::with_capacity(plan.len());
    for tile in &plan {
        let view = img.crop_imm(0, tile.top, width, tile.height);
        let mut out = Vec::new();
        view.write_to(
            &mut std::io::Cursor::new(&mut out),
            image::ImageFormat::Png,
        )
        .map_err(|e| PageError::Decode {
            url: url.to_string(),
            message: format!("tile {} encode failed: {e}", tile.index),
        })?;
        buffers.push(out);
    }

    Ok(buffers)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Asserts that the plan exactly covers [0, height] with no gaps and
    /// no tile out of bounds
    fn assert_covers(plan: &[TileBounds], height: u32) {
        assert!(!plan.is_empty());
        assert_eq!(plan[0].top, 0);

        let last = plan.last().unwrap();
        assert_eq!(last.top + last.height, height);

        for tile in plan {
            assert!(tile.top + tile.height <= height, "tile exceeds bounds");
        }
        for pair in plan.windows(2) {
            assert!(
                pair[1].top <= pair[0].top + pair[0].height,
                "gap between tiles {} and {}",
                pair[0].index,
                pair[1].index
            );
        }
    }

    #[test]
    fn test_short_image_single_tile() {
        for height in [1, 100, MAX_TILE_HEIGHT] {
            let plan = plan_tiles(height, MAX_TILE_HEIGHT, TILE_OVERLAP);
            assert_eq!(plan.len(), 1);
            assert_eq!(plan[0].top, 0);
            assert_eq!(plan[0].height, height);
        }
    }

    #[test]
    fn test_degenerate_overlap_guard() {
        // Height below the overlap still produces one full-image tile
        let plan = plan_tiles(50, 4096, 100);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].height, 50);
    }

    #[test]
    fn test_tall_image_coverage() {
        for height in [4097, 5000, 8192, 10_000, 50_000] {
            let plan = plan_tiles(height, MAX_TILE_HEIGHT, TILE_OVERLAP);
            assert!(plan.len() > 1, "height {height} should slice");
            assert_covers(&plan, height);
        }
    }

    #[test]
    fn test_interior_tiles_full_height() {
        let plan = plan_tiles(10_000, MAX_TILE_HEIGHT, TILE_OVERLAP);
        for tile in &plan[..plan.len() - 1] {
            assert_eq!(tile.height, MAX_TILE_HEIGHT);
        }
    }

    #[test]
    fn test_consecutive_tiles_overlap() {
        let plan = plan_tiles(10_000, MAX_TILE_HEIGHT, TILE_OVERLAP);
        for pair in plan.windows(2) {
            let shared = (pair[0].top + pair[0].height).saturating_sub(pair[1].top);
            assert!(shared >= TILE_OVERLAP, "tiles share only {shared}px");
        }
    }

    #[test]
    fn test_last_tile_never_thinner_than_overlap() {
        // The slice-count arithmetic keeps the clamped tail strictly wider
        // than the overlap; the shift-window guard backs that invariant.
        for height in [4097, 4196, 8093, 8192, 12_189, 33_333] {
            let plan = plan_tiles(height, 4096, 100);
            let last = plan.last().unwrap();
            assert!(last.height > 100, "height {height}: tail {}", last.height);
            assert_covers(&plan, height);
        }
    }

    #[test]
    fn test_zero_overlap() {
        let plan = plan_tiles(10_000, 4096, 0);
        assert_covers(&plan, 10_000);
        assert_eq!(plan[1].top, 4096);
    }

    #[test]
    fn test_overlap_at_least_tile_height_ignored() {
        let plan = plan_tiles(10_000, 4096, 4096);
        assert_covers(&plan, 10_000);
    }

    #[test]
    fn test_determinism() {
        let a = plan_tiles(12_345, MAX_TILE_HEIGHT, TILE_OVERLAP);
        let b = plan_tiles(12_345, MAX_TILE_HEIGHT, TILE_OVERLAP);
        assert_eq!(a, b);
    }

    #[test]
    fn test_slice_short_screenshot_passthrough() {
        let img = image::RgbaImage::from_pixel(10, 20, image::Rgba([1, 2, 3, 255]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let tiles = slice_screenshot("https://example.com/", &png).unwrap();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0], png);
    }

    #[test]
    fn test_slice_tall_screenshot() {
        let img = image::RgbaImage::from_pixel(8, 9000, image::Rgba([9, 9, 9, 255]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let tiles = slice_screenshot("https://example.com/", &png).unwrap();
        let plan = plan_tiles(9000, MAX_TILE_HEIGHT, TILE_OVERLAP);
        assert_eq!(tiles.len(), plan.len());

        for (buffer, bounds) in tiles.iter().zip(&plan) {
            let tile = image::load_from_memory(buffer).unwrap();
            assert_eq!(tile.dimensions(), (8, bounds.height));
        }
    }

    #[test]
    fn test_slice_rejects_garbage() {
        let result = slice_screenshot("https://example.com/", b"not a png");
        assert!(matches!(result, Err(PageError::Decode { .. })));
    }
}
