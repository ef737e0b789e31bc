//! Tile requests and their validation against a dataset.

use std::sync::Arc;

use renderer::{Colormap, RescalePair, SampleType, ValueTransform};
use tile_common::{TileCoord, TileError, TileResult};
use uuid::Uuid;

use crate::config::{TilerConfig, MAX_TILE_SIZE};
use crate::metadata::RasterMetadata;
use crate::resample::ResamplingMethod;

/// A request for one web mercator tile.
#[derive(Debug, Clone)]
pub struct TileRequest {
    pub coord: TileCoord,
    /// 1-based band indices; `None` means every band of the dataset.
    pub bands: Option<Vec<usize>>,
    pub rescale: Option<Vec<RescalePair>>,
    pub colormap: Option<Arc<Colormap>>,
    pub resampling: ResamplingMethod,
    pub tile_size: usize,
    pub sample_type: SampleType,
    /// Request-scoped token for logs and staging names.
    pub request_id: Uuid,
}

/// Bands and value transform of a request checked against a dataset.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub bands: Vec<usize>,
    pub transform: ValueTransform,
}

impl TileRequest {
    pub fn new(coord: TileCoord) -> Self {
        Self::from_config(coord, &TilerConfig::default())
    }

    /// A request using the configured defaults.
    pub fn from_config(coord: TileCoord, config: &TilerConfig) -> Self {
        Self {
            coord,
            bands: None,
            rescale: None,
            colormap: None,
            resampling: config.resampling,
            tile_size: config.tile_size,
            sample_type: config.sample_type,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn with_bands(mut self, bands: Vec<usize>) -> Self {
        self.bands = Some(bands);
        self
    }

    pub fn with_rescale(mut self, pairs: Vec<RescalePair>) -> Self {
        self.rescale = Some(pairs);
        self
    }

    pub fn with_colormap(mut self, colormap: Arc<Colormap>) -> Self {
        self.colormap = Some(colormap);
        self
    }

    pub fn with_resampling(mut self, resampling: ResamplingMethod) -> Self {
        self.resampling = resampling;
        self
    }

    pub fn with_tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_sample_type(mut self, sample_type: SampleType) -> Self {
        self.sample_type = sample_type;
        self
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// The value transform this request asks for.
    pub fn transform(&self) -> TileResult<ValueTransform> {
        match (&self.rescale, &self.colormap) {
            (Some(_), Some(_)) => Err(TileError::ConflictingTransforms),
            (Some(pairs), None) => Ok(ValueTransform::Rescale(pairs.clone())),
            (None, Some(colormap)) => Ok(ValueTransform::Colormap(Arc::clone(colormap))),
            (None, None) => Ok(ValueTransform::None),
        }
    }

    /// Check every parameter against the dataset before anything is read.
    pub fn resolve(&self, metadata: &RasterMetadata) -> TileResult<ResolvedRequest> {
        self.coord.validate()?;
        if self.tile_size == 0 || self.tile_size > MAX_TILE_SIZE {
            return Err(TileError::Config(format!(
                "tile size {} outside 1-{}",
                self.tile_size, MAX_TILE_SIZE
            )));
        }

        let bands = match &self.bands {
            Some(bands) => bands.clone(),
            None => (1..=metadata.band_count).collect(),
        };
        if let Some(&band) = bands.iter().find(|&&b| b == 0 || b > metadata.band_count) {
            return Err(TileError::InvalidBandIndex {
                band,
                band_count: metadata.band_count,
            });
        }

        let transform = self.transform()?;
        let colormap = matches!(transform, ValueTransform::Colormap(_));
        let count_ok = if colormap {
            bands.len() == 1
        } else {
            matches!(bands.len(), 1 | 3 | 4)
        };
        if !count_ok {
            return Err(TileError::InvalidBandCount {
                count: bands.len(),
                colormap,
            });
        }
        transform.validate(bands.len())?;

        Ok(ResolvedRequest { bands, transform })
    }
}
