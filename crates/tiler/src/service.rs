//! Tile service: a raster store, its metadata cache and configuration.

use std::sync::Arc;
use std::time::Instant;

use renderer::{encode, Colormap, ImageFormat, OutputTile};
use tile_common::{TileError, TileResult};
use tracing::{debug, info, instrument};

use crate::cache::{MetadataCache, MetadataCacheStats};
use crate::config::TilerConfig;
use crate::metadata::RasterMetadata;
use crate::render;
use crate::request::TileRequest;
use crate::store::{DatasetHandle, RasterStore};

/// Renders tiles from one raster store.
pub struct TileService<S: RasterStore + ?Sized> {
    store: Arc<S>,
    cache: MetadataCache,
    config: TilerConfig,
}

impl<S: RasterStore + ?Sized> TileService<S> {
    pub fn new(store: Arc<S>, config: TilerConfig) -> Self {
        let cache = MetadataCache::new(config.metadata_cache_capacity);
        Self {
            store,
            cache,
            config,
        }
    }

    /// Service with default configuration.
    pub fn with_store(store: Arc<S>) -> Self {
        Self::new(store, TilerConfig::default())
    }

    pub fn config(&self) -> &TilerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// A request for `coord` carrying this service's defaults.
    pub fn request(&self, coord: tile_common::TileCoord) -> TileRequest {
        TileRequest::from_config(coord, &self.config)
    }

    /// Metadata of a dataset, from the cache when present.
    pub async fn metadata(&self, dataset: &str) -> TileResult<Arc<RasterMetadata>> {
        Ok(self.open(dataset).await?.1)
    }

    async fn open(&self, dataset: &str) -> TileResult<(DatasetHandle, Arc<RasterMetadata>)> {
        if let Some(metadata) = self.cache.get(dataset).await {
            return Ok((DatasetHandle::new(dataset), metadata));
        }

        let handle = self.store.open(dataset).await?;
        let metadata = Arc::new(self.store.metadata(&handle).await?);
        debug!(
            dataset,
            width = metadata.width,
            height = metadata.height,
            bands = metadata.band_count,
            overviews = metadata.overviews.len(),
            "Loaded dataset metadata"
        );
        self.cache.insert(dataset, Arc::clone(&metadata)).await;
        Ok((handle, metadata))
    }

    /// Render one tile of a dataset.
    #[instrument(skip(self, request), fields(
        request_id = %request.request_id,
        dataset = %dataset,
        z = request.coord.z,
        x = request.coord.x,
        y = request.coord.y,
    ))]
    pub async fn render_tile(&self, dataset: &str, request: &TileRequest) -> TileResult<OutputTile> {
        let start = Instant::now();
        let (handle, metadata) = self.open(dataset).await?;
        let tile = render::render_tile(self.store.as_ref(), &handle, &metadata, request).await?;

        info!(
            tile_size = request.tile_size,
            resampling = %request.resampling,
            empty = tile.is_fully_transparent(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Rendered tile"
        );
        Ok(tile)
    }

    /// Render and encode one tile. `format` defaults to the configured one.
    pub async fn render_tile_encoded(
        &self,
        dataset: &str,
        request: &TileRequest,
        format: Option<ImageFormat>,
    ) -> TileResult<Vec<u8>> {
        let tile = self.render_tile(dataset, request).await?;
        encode(&tile, format.unwrap_or(self.config.format))
    }

    /// Colormap built from the attribute table of a band.
    pub async fn colormap_from_attribute_table(
        &self,
        dataset: &str,
        band: usize,
    ) -> TileResult<Arc<Colormap>> {
        let (handle, metadata) = self.open(dataset).await?;
        if band == 0 || band > metadata.band_count {
            return Err(TileError::InvalidBandIndex {
                band,
                band_count: metadata.band_count,
            });
        }

        let table = self
            .store
            .attribute_table(&handle, band)
            .await?
            .ok_or_else(|| {
                TileError::UnsupportedColormapSource(format!(
                    "band {} of '{}' has no attribute table",
                    band, dataset
                ))
            })?;
        Ok(Arc::new(Colormap::from_attribute_table(&table)?))
    }

    /// Forget cached metadata of a dataset after it changed in the store.
    pub async fn invalidate(&self, dataset: &str) -> bool {
        self.cache.invalidate(dataset).await
    }

    pub async fn cache_stats(&self) -> MetadataCacheStats {
        self.cache.stats().await
    }
}
