//! Tile compositing and image encoding.
//!
//! - Colormaps built from intervals, control points or attribute tables
//! - Compositing bands into an RGBA tile (pass-through, rescale, colormap)
//! - PNG encoding (indexed, 8-bit RGBA, 16-bit RGBA)

pub mod colormap;
pub mod compose;
pub mod encode;
pub mod png;

pub use colormap::{AttributeColumn, AttributeTable, Color, ColorInterval, ColorPoint, Colormap, ColumnUsage};
pub use compose::{compose_tile, OutputTile, RescalePair, SampleType, ValueTransform};
pub use encode::{encode, ImageFormat};
