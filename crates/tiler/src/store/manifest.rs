//! File-backed raster store described by a YAML or JSON manifest.
//!
//! Each band (and each pre-computed overview) is a raw array of
//! little-endian `f32` values in row-major order. Files are decoded on the
//! first read and kept in memory afterwards.
//!
//! ```yaml
//! datasets:
//!   - id: biomass
//!     width: 2048
//!     height: 2048
//!     geotransform: [14401959.12, 76.43, 0.0, -1252344.27, 0.0, -76.43]
//!     nodata: [0.0]
//!     bands:
//!       - file: biomass_b1.f32
//!         overviews:
//!           - { file: biomass_b1_ov1.f32, width: 1024, height: 1024 }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use renderer::AttributeTable;
use serde::{Deserialize, Serialize};
use tile_common::{GeoTransform, PixelBuffer, PixelRect};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{read_from_buffer, DatasetHandle, RasterStore};
use crate::error::{StoreError, StoreResult};
use crate::metadata::RasterMetadata;

/// Top-level manifest document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub datasets: Vec<DatasetManifest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub id: String,
    pub width: usize,
    pub height: usize,
    pub geotransform: GeoTransform,
    /// Per-band nodata; missing trailing entries mean no nodata.
    #[serde(default)]
    pub nodata: Vec<Option<f32>>,
    #[serde(default)]
    pub thematic: bool,
    pub bands: Vec<BandManifest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandManifest {
    /// Path to the band file, relative to the manifest.
    pub file: PathBuf,
    #[serde(default)]
    pub overviews: Vec<OverviewManifest>,
    #[serde(default)]
    pub attribute_table: Option<AttributeTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewManifest {
    pub file: PathBuf,
    pub width: usize,
    pub height: usize,
}

impl Manifest {
    /// Parse a manifest; `.json` files are read as JSON, everything else
    /// as YAML.
    pub fn parse(text: &str, path: &Path) -> StoreResult<Self> {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(text)?)
        } else {
            Ok(serde_yaml::from_str(text)?)
        }
    }

    fn validate(&self) -> StoreResult<()> {
        let mut seen = HashSet::new();
        for dataset in &self.datasets {
            if !seen.insert(dataset.id.as_str()) {
                return Err(StoreError::invalid_manifest(format!(
                    "duplicate dataset id '{}'",
                    dataset.id
                )));
            }
            if dataset.bands.is_empty() {
                return Err(StoreError::invalid_manifest(format!(
                    "dataset '{}' has no bands",
                    dataset.id
                )));
            }
            if dataset.nodata.len() > dataset.bands.len() {
                return Err(StoreError::invalid_manifest(format!(
                    "dataset '{}' lists {} nodata values for {} bands",
                    dataset.id,
                    dataset.nodata.len(),
                    dataset.bands.len()
                )));
            }
        }
        Ok(())
    }
}

impl DatasetManifest {
    fn metadata(&self) -> StoreResult<RasterMetadata> {
        let mut nodata = self.nodata.clone();
        nodata.resize(self.bands.len(), None);

        let overview_sizes: Vec<Vec<(usize, usize)>> = self
            .bands
            .iter()
            .map(|b| b.overviews.iter().map(|o| (o.width, o.height)).collect())
            .collect();

        RasterMetadata::new(
            self.width,
            self.height,
            self.geotransform,
            nodata,
            self.thematic,
            &overview_sizes,
        )
    }

    /// File and size of a 1-based band at an overview index.
    fn level_file(&self, band: usize, overview: usize) -> StoreResult<(&Path, usize, usize)> {
        let entry = band
            .checked_sub(1)
            .and_then(|i| self.bands.get(i))
            .ok_or_else(|| StoreError::BandOutOfRange {
                dataset: self.id.clone(),
                band,
            })?;

        if overview == 0 {
            return Ok((entry.file.as_path(), self.width, self.height));
        }
        entry
            .overviews
            .get(overview - 1)
            .map(|o| (o.file.as_path(), o.width, o.height))
            .ok_or_else(|| StoreError::OverviewOutOfRange {
                dataset: self.id.clone(),
                band,
                index: overview,
            })
    }
}

/// Encode band values as little-endian `f32` bytes.
pub fn band_to_bytes(values: &[f32]) -> Vec<u8> {
    if cfg!(target_endian = "little") {
        bytemuck::cast_slice(values).to_vec()
    } else {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }
}

/// Decode little-endian `f32` bytes. `bytes.len()` must be a multiple of 4.
fn bytes_to_band(bytes: &[u8]) -> Vec<f32> {
    let mut values = vec![0f32; bytes.len() / std::mem::size_of::<f32>()];
    bytemuck::cast_slice_mut::<f32, u8>(&mut values).copy_from_slice(bytes);
    if cfg!(target_endian = "big") {
        for v in &mut values {
            *v = f32::from_bits(v.to_bits().swap_bytes());
        }
    }
    values
}

type LevelKey = (String, usize, usize);

/// Raster store over manifest-described band files.
#[derive(Debug)]
pub struct ManifestRasterStore {
    base_dir: PathBuf,
    datasets: HashMap<String, DatasetManifest>,
    loaded: RwLock<HashMap<LevelKey, Arc<PixelBuffer>>>,
}

impl ManifestRasterStore {
    /// Load a manifest file. Band paths resolve against its directory.
    pub async fn open_manifest(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await?;
        let manifest = Manifest::parse(&text, path)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let store = Self::from_manifest(manifest, base_dir)?;
        info!(
            manifest = %path.display(),
            datasets = store.datasets.len(),
            "Loaded raster manifest"
        );
        Ok(store)
    }

    pub fn from_manifest(manifest: Manifest, base_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        manifest.validate()?;
        Ok(Self {
            base_dir: base_dir.into(),
            datasets: manifest
                .datasets
                .into_iter()
                .map(|d| (d.id.clone(), d))
                .collect(),
            loaded: RwLock::new(HashMap::new()),
        })
    }

    /// Identifiers of all datasets, sorted.
    pub fn dataset_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.datasets.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    fn dataset(&self, id: &str) -> StoreResult<&DatasetManifest> {
        self.datasets
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn load_level(
        &self,
        dataset: &DatasetManifest,
        band: usize,
        overview: usize,
    ) -> StoreResult<Arc<PixelBuffer>> {
        let key = (dataset.id.clone(), band, overview);
        if let Some(buffer) = self.loaded.read().await.get(&key) {
            return Ok(Arc::clone(buffer));
        }

        let (file, width, height) = dataset.level_file(band, overview)?;
        let path = self.base_dir.join(file);
        let bytes = tokio::fs::read(&path).await?;
        let expected = width * height * std::mem::size_of::<f32>();
        if bytes.len() != expected {
            return Err(StoreError::invalid_manifest(format!(
                "{} holds {} bytes, expected {} for {}x{} f32",
                path.display(),
                bytes.len(),
                expected,
                width,
                height
            )));
        }

        let buffer = Arc::new(PixelBuffer::new(width, height, bytes_to_band(&bytes)));
        debug!(path = %path.display(), band, overview, "Decoded band file");

        let mut loaded = self.loaded.write().await;
        Ok(Arc::clone(loaded.entry(key).or_insert(buffer)))
    }
}

#[async_trait]
impl RasterStore for ManifestRasterStore {
    async fn open(&self, dataset: &str) -> StoreResult<DatasetHandle> {
        self.dataset(dataset)?;
        Ok(DatasetHandle::new(dataset))
    }

    async fn metadata(&self, handle: &DatasetHandle) -> StoreResult<RasterMetadata> {
        self.dataset(handle.id())?.metadata()
    }

    async fn read_window(
        &self,
        handle: &DatasetHandle,
        band: usize,
        overview: usize,
        window: PixelRect,
        out_size: Option<(usize, usize)>,
    ) -> StoreResult<PixelBuffer> {
        let dataset = self.dataset(handle.id())?;
        let buffer = self.load_level(dataset, band, overview).await?;
        read_from_buffer(&buffer, window, out_size)
    }

    async fn attribute_table(
        &self,
        handle: &DatasetHandle,
        band: usize,
    ) -> StoreResult<Option<AttributeTable>> {
        let dataset = self.dataset(handle.id())?;
        Ok(band
            .checked_sub(1)
            .and_then(|i| dataset.bands.get(i))
            .and_then(|b| b.attribute_table.clone()))
    }
}
