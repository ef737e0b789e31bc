//! Tests for web mercator grid math and geotransform round trips.

use tile_common::{tile_extent, tile_span, GeoTransform, TileCoord};

// ============================================================================
// tile_extent tests
// ============================================================================

#[test]
fn test_tile_span_halves_per_zoom() {
    for z in 0..24u32 {
        let ratio = tile_span(z) / tile_span(z + 1);
        assert!((ratio - 2.0).abs() < 1e-12);
    }
}

#[test]
fn test_known_tile_extent() {
    // Tile used by the reference imagery checks
    let extent = tile_extent(&TileCoord::new(7, 115, 74));
    let span = 78271.516 / 128.0 * 512.0;

    assert!((extent.left() - (-20037508.342789244 + span * 115.0)).abs() < 1e-6);
    assert!((extent.top() - (20037508.342789244 - span * 74.0)).abs() < 1e-6);
    assert!(extent.left() > 0.0, "x=115 at z7 is east of the meridian");
    assert!(extent.top() < 0.0, "y=74 at z7 is south of the equator");
}

#[test]
fn test_extent_is_positive_everywhere() {
    for z in [0u32, 1, 5, 12, 18, 22] {
        let n = 1u32 << z;
        for (x, y) in [(0, 0), (n - 1, 0), (0, n - 1), (n - 1, n - 1)] {
            let extent = tile_extent(&TileCoord::new(z, x, y));
            assert!(extent.right() > extent.left(), "z={} x={} y={}", z, x, y);
            assert!(extent.top() > extent.bottom(), "z={} x={} y={}", z, x, y);
        }
    }
}

// ============================================================================
// GeoTransform tests
// ============================================================================

#[test]
fn test_tile_corners_map_back_to_pixel_grid() {
    // 80m raster whose origin sits on a tile corner
    let extent = tile_extent(&TileCoord::new(10, 900, 600));
    let gt = GeoTransform::north_up(extent.left(), extent.top(), 80.0, 80.0);
    let inv = gt.invert().unwrap();

    let (col, row) = inv.apply(extent.left(), extent.top());
    assert!(col.abs() < 1e-6);
    assert!(row.abs() < 1e-6);

    let (col, row) = inv.apply(extent.right(), extent.bottom());
    let expected = extent.width() / 80.0;
    assert!((col - expected).abs() < 1e-6);
    assert!((row - expected).abs() < 1e-6);
}
