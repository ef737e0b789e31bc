//! Web mercator grid math.
//!
//! Converts z/x/y tile indices to projected extents and raster pixel
//! positions to display (tile) pixel positions.

use crate::{BoundingBox, TileCoord};

/// Left edge of the web mercator grid in meters.
pub const ORIGIN_X: f64 = -20037508.342789244;

/// Top edge of the web mercator grid in meters.
pub const ORIGIN_Y: f64 = 20037508.342789244;

/// Tile width in pixels the base resolution is defined against.
pub const MERCATOR_TILE_PIXELS: f64 = 512.0;

/// Meters per pixel at zoom 0 (for a 512 pixel tile).
pub const BASE_RESOLUTION: f64 = 78271.516;

/// Size of one tile edge in projected meters at `zoom`.
pub fn tile_span(zoom: u32) -> f64 {
    let units_per_pixel = BASE_RESOLUTION / 2f64.powi(zoom as i32);
    units_per_pixel * MERCATOR_TILE_PIXELS
}

/// Projected extent of a web mercator tile.
pub fn tile_extent(coord: &TileCoord) -> BoundingBox {
    let span = tile_span(coord.z);

    let left = ORIGIN_X + span * coord.x as f64;
    let top = ORIGIN_Y - span * coord.y as f64;
    let right = left + span;
    let bottom = top - span;

    BoundingBox::from_edges(left, top, right, bottom)
}

/// Convert a raster pixel position to display position (float version).
///
/// Extent and boundary math must stay in floats until the last step,
/// otherwise tiles pick up seams along their edges.
pub fn pixel_to_display_f(
    col: f64,
    row: f64,
    origin_col: f64,
    origin_row: f64,
    pixels_per_display_pixel: f64,
) -> (f64, f64) {
    let x = (col - origin_col) / pixels_per_display_pixel;
    let y = (row - origin_row) / pixels_per_display_pixel;
    (x, y)
}

/// Convert a raster pixel position to display position, truncating toward zero.
pub fn pixel_to_display(
    col: f64,
    row: f64,
    origin_col: f64,
    origin_row: f64,
    pixels_per_display_pixel: f64,
) -> (i64, i64) {
    let (x, y) = pixel_to_display_f(col, row, origin_col, origin_row, pixels_per_display_pixel);
    (x.trunc() as i64, y.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom0_covers_world() {
        let extent = tile_extent(&TileCoord::new(0, 0, 0));
        assert_eq!(extent.left(), ORIGIN_X);
        assert_eq!(extent.top(), ORIGIN_Y);
        // BASE_RESOLUTION * 512 is slightly larger than the mercator width
        assert!((extent.width() - 78271.516 * 512.0).abs() < 1e-6);
    }

    #[test]
    fn test_extent_dimensions_per_zoom() {
        for z in 0..20u32 {
            let n = 1u32 << z;
            for (x, y) in [(0, 0), (n - 1, n - 1), (n / 2, n / 3)] {
                let extent = tile_extent(&TileCoord::new(z, x, y));
                let expected = 78271.516 / 2f64.powi(z as i32) * 512.0;
                assert!(extent.right() > extent.left());
                assert!(extent.top() > extent.bottom());
                assert!((extent.width() - expected).abs() < 1e-6);
                assert!((extent.height() - expected).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_adjacent_tiles_share_edges() {
        let a = tile_extent(&TileCoord::new(7, 115, 74));
        let b = tile_extent(&TileCoord::new(7, 116, 74));
        let c = tile_extent(&TileCoord::new(7, 115, 75));
        assert!((a.right() - b.left()).abs() < 1e-6);
        assert!((a.bottom() - c.top()).abs() < 1e-6);
    }

    #[test]
    fn test_pixel_to_display_variants() {
        let (fx, fy) = pixel_to_display_f(10.5, 4.25, 10.0, 4.0, 0.25);
        assert_eq!((fx, fy), (2.0, 1.0));

        let (fx, fy) = pixel_to_display_f(9.0, 3.0, 10.3, 3.3, 0.5);
        assert!((fx + 2.6).abs() < 1e-9);
        assert!((fy + 0.6).abs() < 1e-9);

        // Truncation is toward zero, not floor
        assert_eq!(pixel_to_display(9.0, 3.0, 10.3, 3.3, 0.5), (-2, 0));
        assert_eq!(pixel_to_display(12.0, 5.0, 10.0, 4.0, 0.3), (6, 3));
    }
}
