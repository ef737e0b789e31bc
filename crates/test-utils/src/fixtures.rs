//! Common georeferencing fixtures.
//!
//! Rasters in tests are laid out relative to a web mercator tile so the
//! expected read plan can be worked out by hand.

use tile_common::{tile_extent, GeoTransform, TileCoord};

/// Tile used by the end-to-end scenarios.
pub const SCENARIO_TILE: TileCoord = TileCoord { z: 7, x: 115, y: 74 };

/// Geotransform of a raster aligned to `coord`.
///
/// The tile spans `pixels_per_tile` raster pixels on each axis and the
/// raster extends `margin` pixels past every tile edge, so the raster is
/// `pixels_per_tile + 2 * margin` pixels square.
pub fn covering_geotransform(coord: &TileCoord, pixels_per_tile: usize, margin: usize) -> GeoTransform {
    let extent = tile_extent(coord);
    let pixel_size = extent.width() / pixels_per_tile as f64;
    GeoTransform::north_up(
        extent.left() - margin as f64 * pixel_size,
        extent.top() + margin as f64 * pixel_size,
        pixel_size,
        pixel_size,
    )
}

/// Geotransform of a raster whose top-left corner sits at the centre of
/// `coord`, so the tile is only partially covered.
pub fn quarter_covering_geotransform(coord: &TileCoord, pixels_per_tile: usize) -> GeoTransform {
    let extent = tile_extent(coord);
    let pixel_size = extent.width() / pixels_per_tile as f64;
    GeoTransform::north_up(
        extent.left() + extent.width() / 2.0,
        extent.top() - extent.height() / 2.0,
        pixel_size,
        pixel_size,
    )
}

/// A tile on the far side of the world from [`SCENARIO_TILE`].
pub fn distant_tile() -> TileCoord {
    TileCoord::new(7, 10, 10)
}
