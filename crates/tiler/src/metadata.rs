//! Dataset metadata needed to plan tile reads.

use tile_common::{BoundingBox, GeoTransform};

use crate::error::{StoreError, StoreResult};
use crate::overview::OverviewCatalog;

/// Size, georeferencing, nodata and overviews of a raster dataset.
///
/// Immutable once built; shared between requests through the metadata cache.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterMetadata {
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub geotransform: GeoTransform,
    /// Projected -> pixel transform.
    pub inverse: GeoTransform,
    /// Nodata value of each band, in band order.
    pub nodata: Vec<Option<f32>>,
    /// Bands hold class values rather than measurements.
    pub thematic: bool,
    pub overviews: OverviewCatalog,
}

impl RasterMetadata {
    /// Build metadata, computing the inverse transform and overview catalog.
    ///
    /// `nodata` has one entry per band and defines the band count.
    pub fn new(
        width: usize,
        height: usize,
        geotransform: GeoTransform,
        nodata: Vec<Option<f32>>,
        thematic: bool,
        per_band_overview_sizes: &[Vec<(usize, usize)>],
    ) -> StoreResult<Self> {
        if width == 0 || height == 0 {
            return Err(StoreError::invalid_metadata(format!(
                "raster size {}x{} is empty",
                width, height
            )));
        }
        if nodata.is_empty() {
            return Err(StoreError::invalid_metadata("dataset has no bands"));
        }
        let inverse = geotransform.invert().ok_or_else(|| {
            StoreError::invalid_metadata(format!(
                "geotransform {:?} is not invertible",
                geotransform.coefficients()
            ))
        })?;

        Ok(Self {
            width,
            height,
            band_count: nodata.len(),
            geotransform,
            inverse,
            nodata,
            thematic,
            overviews: OverviewCatalog::load(width, height, per_band_overview_sizes),
        })
    }

    /// Nodata value of a 1-based band.
    pub fn nodata(&self, band: usize) -> Option<f32> {
        band.checked_sub(1)
            .and_then(|i| self.nodata.get(i))
            .copied()
            .flatten()
    }

    /// Projected footprint of the raster.
    pub fn bounds(&self) -> BoundingBox {
        let (x0, y0) = self.geotransform.apply(0.0, 0.0);
        let (x1, y1) = self.geotransform.apply(self.width as f64, self.height as f64);
        BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_new() {
        let gt = GeoTransform::north_up(1000.0, 2000.0, 10.0, 10.0);
        let meta = RasterMetadata::new(100, 50, gt, vec![Some(0.0), None, None], false, &[]).unwrap();

        assert_eq!(meta.band_count, 3);
        assert_eq!(meta.nodata(1), Some(0.0));
        assert_eq!(meta.nodata(2), None);
        assert_eq!(meta.nodata(0), None);
        assert_eq!(meta.nodata(4), None);
        assert_eq!(meta.inverse.apply(1000.0, 2000.0), (0.0, 0.0));

        let bounds = meta.bounds();
        assert_eq!(bounds.min_x, 1000.0);
        assert_eq!(bounds.max_x, 2000.0);
        assert_eq!(bounds.min_y, 1500.0);
        assert_eq!(bounds.max_y, 2000.0);
    }

    #[test]
    fn test_degenerate_geotransform_rejected() {
        let gt = GeoTransform::new([0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let result = RasterMetadata::new(10, 10, gt, vec![None], false, &[]);
        assert!(matches!(result, Err(StoreError::InvalidMetadata(_))));
    }

    #[test]
    fn test_no_bands_rejected() {
        let gt = GeoTransform::north_up(0.0, 0.0, 1.0, 1.0);
        assert!(RasterMetadata::new(10, 10, gt, vec![], false, &[]).is_err());
    }
}
