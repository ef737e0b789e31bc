//! Resolution levels of a dataset and selection of the level to read.
//!
//! Level 0 is the full-resolution raster; pyramid overviews are numbered
//! from 1. Levels are kept as a flat arena sorted by decreasing pixel area,
//! so index 0 of the arena is always the full-resolution level.

use tracing::warn;

/// One resolution level of a raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverviewLevel {
    pub width: usize,
    pub height: usize,
    /// Full-resolution pixels covered by one pixel of this level.
    pub full_res_pixels_per_pixel: f64,
    /// 0 for the full-resolution raster, 1..N for overviews.
    pub index: usize,
}

impl OverviewLevel {
    pub fn full_resolution(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            full_res_pixels_per_pixel: 1.0,
            index: 0,
        }
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// The usable resolution levels of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewCatalog {
    levels: Vec<OverviewLevel>,
}

impl OverviewCatalog {
    /// A catalog with only the full-resolution level.
    pub fn full_resolution(width: usize, height: usize) -> Self {
        Self {
            levels: vec![OverviewLevel::full_resolution(width, height)],
        }
    }

    /// Build the catalog from the overview sizes of every band.
    ///
    /// `per_band_sizes[b][i]` is the (width, height) of overview `i + 1` of
    /// band `b`. The first band is the reference: an overview index is kept
    /// only when every other band has an overview of identical size at that
    /// index.
    pub fn load(
        raster_width: usize,
        raster_height: usize,
        per_band_sizes: &[Vec<(usize, usize)>],
    ) -> Self {
        let mut levels = vec![OverviewLevel::full_resolution(raster_width, raster_height)];

        let Some((reference, others)) = per_band_sizes.split_first() else {
            return Self { levels };
        };

        for (i, &(width, height)) in reference.iter().enumerate() {
            let index = i + 1;

            let mismatch = others
                .iter()
                .position(|sizes| sizes.get(i) != Some(&(width, height)));
            if let Some(band) = mismatch {
                warn!(
                    overview = index,
                    band = band + 2,
                    "Overview size differs between bands, skipping"
                );
                continue;
            }

            if width == 0 || height == 0 || width > raster_width || height > raster_height {
                warn!(overview = index, width, height, "Overview has unusable size, skipping");
                continue;
            }

            levels.push(OverviewLevel {
                width,
                height,
                full_res_pixels_per_pixel: raster_width as f64 / width as f64,
                index,
            });
        }

        // Stable, so the full-resolution level stays first on ties
        levels.sort_by(|a, b| b.area().cmp(&a.area()));

        Self { levels }
    }

    /// All levels, finest first.
    pub fn levels(&self) -> &[OverviewLevel] {
        &self.levels
    }

    /// The full-resolution level.
    pub fn full_resolution_level(&self) -> &OverviewLevel {
        &self.levels[0]
    }

    /// Level with the given overview index (0 = full resolution).
    pub fn by_index(&self, index: usize) -> Option<&OverviewLevel> {
        self.levels.iter().find(|level| level.index == index)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Coarsest level whose resolution is still at least as fine as
    /// `pixels_per_display_pixel` full-resolution pixels per output pixel.
    ///
    /// Falls back to the full-resolution level when no overview qualifies.
    pub fn select_level(&self, pixels_per_display_pixel: f64) -> &OverviewLevel {
        let mut selected = &self.levels[0];
        for level in &self.levels[1..] {
            if level.full_res_pixels_per_pixel > pixels_per_display_pixel {
                break;
            }
            selected = level;
        }
        selected
    }
}
