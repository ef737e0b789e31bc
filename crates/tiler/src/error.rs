//! Error types for raster stores.

use thiserror::Error;
use tile_common::{PixelRect, TileError};

/// Errors raised by a [`RasterStore`](crate::store::RasterStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// No dataset is registered under this identifier.
    #[error("dataset not found: {0}")]
    NotFound(String),

    /// Band index (1-based) is outside the dataset.
    #[error("band {band} out of range for dataset {dataset}")]
    BandOutOfRange { dataset: String, band: usize },

    /// Overview index is not available for the band.
    #[error("overview {index} not available for band {band} of dataset {dataset}")]
    OverviewOutOfRange {
        dataset: String,
        band: usize,
        index: usize,
    },

    /// The requested window does not fit inside the band.
    #[error("window {window:?} exceeds {width}x{height} raster")]
    WindowOutOfBounds {
        window: PixelRect,
        width: usize,
        height: usize,
    },

    /// Dataset metadata could not be interpreted.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Manifest could not be parsed or references bad files.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Create an InvalidManifest error.
    pub fn invalid_manifest(msg: impl Into<String>) -> Self {
        Self::InvalidManifest(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidManifest(err.to_string())
    }
}

impl From<serde_yaml::Error> for StoreError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::InvalidManifest(err.to_string())
    }
}

impl From<StoreError> for TileError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => TileError::DatasetNotFound(id),
            other => TileError::ReadFailed(other.to_string()),
        }
    }
}

/// Result type for raster store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_dataset_not_found() {
        let err: TileError = StoreError::NotFound("landcover".into()).into();
        assert!(matches!(err, TileError::DatasetNotFound(ref id) if id == "landcover"));
        assert_eq!(err.http_status_code(), 404);
    }

    #[test]
    fn test_other_errors_map_to_read_failed() {
        let err: TileError = StoreError::BandOutOfRange {
            dataset: "dem".into(),
            band: 3,
        }
        .into();
        assert!(matches!(err, TileError::ReadFailed(_)));
        assert_eq!(err.http_status_code(), 500);
    }
}
