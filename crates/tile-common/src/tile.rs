//! Tile addressing on the power-of-two web mercator grid.

use crate::{TileError, TileResult};
use serde::{Deserialize, Serialize};

/// Deepest zoom level accepted by the tiler.
pub const MAX_ZOOM: u32 = 30;

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y), counted from the top
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along each axis at this zoom.
    pub fn matrix_size(&self) -> u64 {
        1u64 << self.z.min(MAX_ZOOM)
    }

    /// Check that x and y fall inside the grid for this zoom.
    pub fn validate(&self) -> TileResult<()> {
        if self.z > MAX_ZOOM
            || u64::from(self.x) >= self.matrix_size()
            || u64::from(self.y) >= self.matrix_size()
        {
            return Err(TileError::InvalidTileCoord {
                z: self.z,
                x: self.x,
                y: self.y,
            });
        }
        Ok(())
    }

    /// Generate a cache key string.
    pub fn cache_key(&self) -> String {
        format!("{}/{}/{}", self.z, self.x, self.y)
    }
}

/// TMS (Tile Map Service) Y-flip conversion.
/// TMS uses bottom-left origin, while XYZ uses top-left.
///
/// Rows outside the grid are passed through unchanged so that
/// [`TileCoord::validate`] reports them.
pub fn tms_to_xyz(z: u32, x: u32, y: u32) -> TileCoord {
    let n = 1u64 << z.min(MAX_ZOOM);
    let y = match (n - 1).checked_sub(u64::from(y)) {
        Some(flipped) if z <= MAX_ZOOM => flipped as u32,
        _ => y,
    };
    TileCoord { z, x, y }
}
