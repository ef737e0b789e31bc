//! Six-coefficient affine geotransform between pixel and projected space.
//!
//! Coefficient layout follows the usual raster convention:
//!
//! ```text
//! x = c[0] + col * c[1] + row * c[2]
//! y = c[3] + col * c[4] + row * c[5]
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    pub fn new(coefficients: [f64; 6]) -> Self {
        Self(coefficients)
    }

    /// North-up transform with square-ish pixels and no rotation.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self([origin_x, pixel_width, 0.0, origin_y, 0.0, -pixel_height.abs()])
    }

    pub fn coefficients(&self) -> &[f64; 6] {
        &self.0
    }

    /// Pixel width in projected units (c[1]).
    pub fn pixel_width(&self) -> f64 {
        self.0[1]
    }

    /// Pixel height in projected units (c[5]); negative for north-up rasters.
    pub fn pixel_height(&self) -> f64 {
        self.0[5]
    }

    pub fn has_rotation(&self) -> bool {
        self.0[2] != 0.0 || self.0[4] != 0.0
    }

    /// Map a (col, row) position to projected (x, y).
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let c = &self.0;
        (
            c[0] + col * c[1] + row * c[2],
            c[3] + col * c[4] + row * c[5],
        )
    }

    /// Compute the inverse transform (projected -> pixel).
    ///
    /// Returns `None` for a degenerate (non-invertible) transform.
    pub fn invert(&self) -> Option<GeoTransform> {
        let c = &self.0;

        // Fast path keeps full precision for the common north-up case.
        if !self.has_rotation() {
            if c[1] == 0.0 || c[5] == 0.0 {
                return None;
            }
            return Some(GeoTransform([
                -c[0] / c[1],
                1.0 / c[1],
                0.0,
                -c[3] / c[5],
                0.0,
                1.0 / c[5],
            ]));
        }

        let det = c[1] * c[5] - c[2] * c[4];
        if det.abs() < 1e-15 {
            return None;
        }
        let inv_det = 1.0 / det;

        Some(GeoTransform([
            (c[2] * c[3] - c[0] * c[5]) * inv_det,
            c[5] * inv_det,
            -c[2] * inv_det,
            (-c[1] * c[3] + c[0] * c[4]) * inv_det,
            -c[4] * inv_det,
            c[1] * inv_det,
        ]))
    }
}
