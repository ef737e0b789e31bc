//! Raster store trait and implementations.
//!
//! A raster store opens datasets by identifier, reports their metadata and
//! reads pixel windows of one band at one resolution level. Tile rendering
//! only talks to this trait, so stores backed by object storage, local
//! files or memory are interchangeable.

mod manifest;
mod memory;

pub use manifest::{
    band_to_bytes, BandManifest, DatasetManifest, Manifest, ManifestRasterStore, OverviewManifest,
};
pub use memory::{MemoryDataset, MemoryRasterStore};

use async_trait::async_trait;
use renderer::AttributeTable;
use tile_common::{PixelBuffer, PixelRect};

use crate::error::{StoreError, StoreResult};
use crate::metadata::RasterMetadata;

/// An opened dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetHandle {
    id: String,
}

impl DatasetHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Trait for reading raster datasets.
#[async_trait]
pub trait RasterStore: Send + Sync {
    /// Open a dataset, failing with [`StoreError::NotFound`] if it does not exist.
    async fn open(&self, dataset: &str) -> StoreResult<DatasetHandle>;

    /// Size, georeferencing, nodata and overviews of an opened dataset.
    async fn metadata(&self, handle: &DatasetHandle) -> StoreResult<RasterMetadata>;

    /// Read `window` of a 1-based band at an overview index (0 = full
    /// resolution).
    ///
    /// When `out_size` is given the window is resampled (nearest) to that
    /// (width, height); otherwise the buffer has the window's size.
    async fn read_window(
        &self,
        handle: &DatasetHandle,
        band: usize,
        overview: usize,
        window: PixelRect,
        out_size: Option<(usize, usize)>,
    ) -> StoreResult<PixelBuffer>;

    /// Attribute table of a thematic band, if the store has one.
    async fn attribute_table(
        &self,
        _handle: &DatasetHandle,
        _band: usize,
    ) -> StoreResult<Option<AttributeTable>> {
        Ok(None)
    }
}

/// Cut `window` out of a band buffer, decimating to `out_size` if given.
pub(crate) fn read_from_buffer(
    band: &PixelBuffer,
    window: PixelRect,
    out_size: Option<(usize, usize)>,
) -> StoreResult<PixelBuffer> {
    if window.is_empty() || !window.fits_within(band.width, band.height) {
        return Err(StoreError::WindowOutOfBounds {
            window,
            width: band.width,
            height: band.height,
        });
    }

    let (out_w, out_h) = out_size.unwrap_or((window.width, window.height));
    if (out_w, out_h) == (window.width, window.height) {
        return Ok(band.crop(&window));
    }

    // Sample the pixel under each output pixel centre
    let col_lookup: Vec<usize> = (0..out_w)
        .map(|c| {
            let offset = ((c as f64 + 0.5) * window.width as f64 / out_w as f64) as usize;
            window.left + offset.min(window.width - 1)
        })
        .collect();

    let mut data = Vec::with_capacity(out_w * out_h);
    for r in 0..out_h {
        let offset = ((r as f64 + 0.5) * window.height as f64 / out_h as f64) as usize;
        let row = window.top + offset.min(window.height - 1);
        data.extend(col_lookup.iter().map(|&c| band.get(c, row)));
    }
    Ok(PixelBuffer::new(out_w, out_h, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band() -> PixelBuffer {
        PixelBuffer::new(4, 4, (0..16).map(|v| v as f32).collect())
    }

    #[test]
    fn test_read_exact_window() {
        let out = read_from_buffer(&band(), PixelRect::new(1, 2, 2, 2), None).unwrap();
        assert_eq!(out.data, vec![9.0, 10.0, 13.0, 14.0]);
    }

    #[test]
    fn test_read_decimated() {
        let out = read_from_buffer(&band(), PixelRect::new(0, 0, 4, 4), Some((2, 2))).unwrap();
        assert_eq!(out.data, vec![5.0, 7.0, 13.0, 15.0]);
    }

    #[test]
    fn test_read_outside_band() {
        let result = read_from_buffer(&band(), PixelRect::new(3, 0, 2, 1), None);
        assert!(matches!(result, Err(StoreError::WindowOutOfBounds { .. })));
    }
}
