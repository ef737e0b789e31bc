//! Web mercator tile extraction from georeferenced rasters.
//!
//! A tile request is turned into a read plan against the dataset (which
//! overview, which source window, where in the tile it lands), the bands
//! are read through a [`RasterStore`], enlarged when the tile is finer than
//! the source, and composited into an RGBA tile by the `renderer` crate.
//!
//! - [`window::plan_window`]: projected tile bounds to source window and
//!   destination rectangle
//! - [`overview::OverviewCatalog`]: resolution levels and level selection
//! - [`resample`]: pixel replication and bilinear enlargement
//! - [`store`]: the raster store trait plus in-memory and manifest stores
//! - [`service::TileService`]: store, metadata cache and configuration

pub mod cache;
pub mod config;
pub mod error;
pub mod metadata;
pub mod overview;
pub mod render;
pub mod request;
pub mod resample;
pub mod service;
pub mod store;
pub mod window;

pub use cache::{MetadataCache, MetadataCacheStats};
pub use config::TilerConfig;
pub use error::{StoreError, StoreResult};
pub use metadata::RasterMetadata;
pub use overview::{OverviewCatalog, OverviewLevel};
pub use render::render_tile;
pub use request::{ResolvedRequest, TileRequest};
pub use resample::ResamplingMethod;
pub use service::TileService;
pub use store::{
    DatasetHandle, DatasetManifest, Manifest, ManifestRasterStore, MemoryDataset,
    MemoryRasterStore, RasterStore,
};
pub use window::{plan_window, Margins, ReadPlan};
