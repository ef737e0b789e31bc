//! In-memory raster store.
//!
//! Datasets are held as decoded band buffers. Overviews can be supplied or
//! generated as a 2x mean pyramid.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use renderer::AttributeTable;
use tile_common::{GeoTransform, PixelBuffer, PixelRect};
use tokio::sync::RwLock;
use tracing::debug;

use super::{read_from_buffer, DatasetHandle, RasterStore};
use crate::error::{StoreError, StoreResult};
use crate::metadata::RasterMetadata;

/// A raster dataset held in memory.
#[derive(Debug, Clone)]
pub struct MemoryDataset {
    geotransform: GeoTransform,
    /// Per band: full resolution first, then overviews 1..N.
    levels: Vec<Vec<PixelBuffer>>,
    nodata: Vec<Option<f32>>,
    thematic: bool,
    attribute_tables: HashMap<usize, AttributeTable>,
}

impl MemoryDataset {
    /// Create a dataset from full-resolution bands of identical size.
    pub fn new(geotransform: GeoTransform, bands: Vec<PixelBuffer>) -> StoreResult<Self> {
        let first = bands
            .first()
            .ok_or_else(|| StoreError::invalid_metadata("dataset has no bands"))?;
        let (width, height) = (first.width, first.height);
        if let Some(bad) = bands.iter().find(|b| b.width != width || b.height != height) {
            return Err(StoreError::invalid_metadata(format!(
                "band size {}x{} differs from {}x{}",
                bad.width, bad.height, width, height
            )));
        }

        let band_count = bands.len();
        Ok(Self {
            geotransform,
            levels: bands.into_iter().map(|b| vec![b]).collect(),
            nodata: vec![None; band_count],
            thematic: false,
            attribute_tables: HashMap::new(),
        })
    }

    /// Set the same nodata value on every band.
    pub fn with_nodata(mut self, nodata: f32) -> Self {
        self.nodata = vec![Some(nodata); self.levels.len()];
        self
    }

    /// Set the nodata value of each band. Extra entries are ignored.
    pub fn with_band_nodata(mut self, nodata: Vec<Option<f32>>) -> Self {
        for (slot, value) in self.nodata.iter_mut().zip(nodata) {
            *slot = value;
        }
        self
    }

    pub fn with_thematic(mut self, thematic: bool) -> Self {
        self.thematic = thematic;
        self
    }

    /// Attach an attribute table to a 1-based band.
    pub fn with_attribute_table(mut self, band: usize, table: AttributeTable) -> Self {
        self.attribute_tables.insert(band, table);
        self
    }

    /// Append an overview to a 1-based band.
    pub fn with_overview(mut self, band: usize, overview: PixelBuffer) -> Self {
        if let Some(levels) = band.checked_sub(1).and_then(|i| self.levels.get_mut(i)) {
            levels.push(overview);
        }
        self
    }

    /// Generate 2x mean overviews for every band until the smaller side
    /// would drop below `min_dimension`.
    pub fn with_pyramid(mut self, min_dimension: usize) -> Self {
        for (band, levels) in self.levels.iter_mut().enumerate() {
            levels.truncate(1);
            let nodata = self.nodata[band];
            loop {
                let Some(last) = levels.last() else { break };
                if last.width / 2 < min_dimension.max(1) || last.height / 2 < min_dimension.max(1) {
                    break;
                }
                let next = downsample_2x(last, nodata);
                levels.push(next);
            }
        }
        self
    }

    pub fn width(&self) -> usize {
        self.levels[0][0].width
    }

    pub fn height(&self) -> usize {
        self.levels[0][0].height
    }

    pub fn band_count(&self) -> usize {
        self.levels.len()
    }

    fn metadata(&self) -> StoreResult<RasterMetadata> {
        let overview_sizes: Vec<Vec<(usize, usize)>> = self
            .levels
            .iter()
            .map(|levels| levels[1..].iter().map(|b| (b.width, b.height)).collect())
            .collect();

        RasterMetadata::new(
            self.width(),
            self.height(),
            self.geotransform,
            self.nodata.clone(),
            self.thematic,
            &overview_sizes,
        )
    }
}

/// Average each 2x2 block, skipping nodata and NaN values.
///
/// Odd trailing rows and columns are dropped. A block with no valid value
/// becomes nodata (or NaN without a nodata value).
fn downsample_2x(band: &PixelBuffer, nodata: Option<f32>) -> PixelBuffer {
    let new_width = band.width / 2;
    let new_height = band.height / 2;
    let empty = nodata.unwrap_or(f32::NAN);

    let mut data = Vec::with_capacity(new_width * new_height);
    for out_y in 0..new_height {
        for out_x in 0..new_width {
            let (x, y) = (out_x * 2, out_y * 2);
            let block = [
                band.get(x, y),
                band.get(x + 1, y),
                band.get(x, y + 1),
                band.get(x + 1, y + 1),
            ];

            let mut sum = 0.0f32;
            let mut count = 0;
            for v in block {
                if !v.is_nan() && Some(v) != nodata {
                    sum += v;
                    count += 1;
                }
            }
            data.push(if count == 0 { empty } else { sum / count as f32 });
        }
    }

    PixelBuffer::new(new_width, new_height, data)
}

/// Raster store over in-memory datasets.
#[derive(Debug, Default)]
pub struct MemoryRasterStore {
    datasets: RwLock<HashMap<String, Arc<MemoryDataset>>>,
}

impl MemoryRasterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a dataset.
    pub async fn insert(&self, id: impl Into<String>, dataset: MemoryDataset) {
        let id = id.into();
        debug!(
            dataset = %id,
            width = dataset.width(),
            height = dataset.height(),
            bands = dataset.band_count(),
            "Registered in-memory dataset"
        );
        self.datasets.write().await.insert(id, Arc::new(dataset));
    }

    /// Remove a dataset, returning whether it existed.
    pub async fn remove(&self, id: &str) -> bool {
        self.datasets.write().await.remove(id).is_some()
    }

    async fn dataset(&self, id: &str) -> StoreResult<Arc<MemoryDataset>> {
        self.datasets
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl RasterStore for MemoryRasterStore {
    async fn open(&self, dataset: &str) -> StoreResult<DatasetHandle> {
        self.dataset(dataset).await?;
        Ok(DatasetHandle::new(dataset))
    }

    async fn metadata(&self, handle: &DatasetHandle) -> StoreResult<RasterMetadata> {
        self.dataset(handle.id()).await?.metadata()
    }

    async fn read_window(
        &self,
        handle: &DatasetHandle,
        band: usize,
        overview: usize,
        window: PixelRect,
        out_size: Option<(usize, usize)>,
    ) -> StoreResult<PixelBuffer> {
        let dataset = self.dataset(handle.id()).await?;
        let levels = band
            .checked_sub(1)
            .and_then(|i| dataset.levels.get(i))
            .ok_or_else(|| StoreError::BandOutOfRange {
                dataset: handle.id().to_string(),
                band,
            })?;
        let buffer = levels
            .get(overview)
            .ok_or_else(|| StoreError::OverviewOutOfRange {
                dataset: handle.id().to_string(),
                band,
                index: overview,
            })?;

        read_from_buffer(buffer, window, out_size)
    }

    async fn attribute_table(
        &self,
        handle: &DatasetHandle,
        band: usize,
    ) -> StoreResult<Option<AttributeTable>> {
        let dataset = self.dataset(handle.id()).await?;
        Ok(dataset.attribute_tables.get(&band).cloned())
    }
}
