//! Common types and utilities shared across the raster tiling crates.

pub mod bbox;
pub mod buffer;
pub mod error;
pub mod geotransform;
pub mod grid;
pub mod tile;

pub use bbox::BoundingBox;
pub use buffer::{PixelBuffer, PixelRect};
pub use error::{TileError, TileResult};
pub use geotransform::GeoTransform;
pub use grid::{pixel_to_display, pixel_to_display_f, tile_extent, tile_span};
pub use tile::{tms_to_xyz, TileCoord};
