//! Screenshot slicing and artifact persistence
//!
//! The tile planner is a pure function over image geometry; everything
//! touching disk or encoding pixels lives in the artifact writer.

mod artifacts;
mod slicer;

pub use artifacts::ArtifactWriter;
pub use slicer::{plan_tiles, slice_screenshot, TileBounds, MAX_TILE_HEIGHT, TILE_OVERLAP};
