//! Error types for tile extraction.

use thiserror::Error;

/// Result type alias using TileError.
pub type TileResult<T> = Result<T, TileError>;

/// Primary error type for tile requests.
#[derive(Debug, Error)]
pub enum TileError {
    // === Request validation ===
    #[error("Invalid number of bands: {count} (valid: 1, 3 or 4; exactly 1 with a colormap)")]
    InvalidBandCount { count: usize, colormap: bool },

    #[error("Band {band} does not exist (dataset has {band_count} bands)")]
    InvalidBandIndex { band: usize, band_count: usize },

    #[error("Length of rescaling ({pairs}) doesn't match number of bands ({bands})")]
    RescaleLengthMismatch { pairs: usize, bands: usize },

    #[error("Invalid rescale range: min={min}, max={max}")]
    InvalidRescaleRange { min: f64, max: f64 },

    #[error("Rescaling and a colormap cannot be combined")]
    ConflictingTransforms,

    #[error("Unknown resampling method: {0}")]
    UnknownResamplingMethod(String),

    #[error("Tile {z}/{x}/{y} is outside the web mercator grid")]
    InvalidTileCoord { z: u32, x: u32, y: u32 },

    #[error("Requested format not supported: {0}")]
    UnsupportedFormat(String),

    // === Colormaps ===
    #[error("Unsupported colormap source: {0}")]
    UnsupportedColormapSource(String),

    #[error("Invalid colormap: {0}")]
    InvalidColormap(String),

    // === Data access ===
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Failed to read data: {0}")]
    ReadFailed(String),

    // === Output ===
    #[error("Encoding failed: {0}")]
    EncodeFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TileError {
    /// True for errors raised while validating a request, before any read.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TileError::InvalidBandCount { .. }
                | TileError::InvalidBandIndex { .. }
                | TileError::RescaleLengthMismatch { .. }
                | TileError::InvalidRescaleRange { .. }
                | TileError::ConflictingTransforms
                | TileError::UnknownResamplingMethod(_)
                | TileError::InvalidTileCoord { .. }
                | TileError::UnsupportedFormat(_)
                | TileError::UnsupportedColormapSource(_)
                | TileError::InvalidColormap(_)
        )
    }

    /// Get the HTTP status code a request layer should report for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            e if e.is_validation() => 400,
            TileError::DatasetNotFound(_) => 404,
            _ => 500,
        }
    }
}

impl From<std::io::Error> for TileError {
    fn from(err: std::io::Error) -> Self {
        TileError::ReadFailed(err.to_string())
    }
}

impl From<serde_json::Error> for TileError {
    fn from(err: serde_json::Error) -> Self {
        TileError::Config(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(TileError::ConflictingTransforms.http_status_code(), 400);
        assert_eq!(
            TileError::InvalidBandCount { count: 2, colormap: false }.http_status_code(),
            400
        );
        assert_eq!(TileError::DatasetNotFound("a".into()).http_status_code(), 404);
        assert_eq!(TileError::ReadFailed("boom".into()).http_status_code(), 500);
    }

    #[test]
    fn test_message_mentions_counts() {
        let err = TileError::RescaleLengthMismatch { pairs: 2, bands: 3 };
        let msg = err.to_string();
        assert!(msg.contains('2'));
        assert!(msg.contains('3'));
    }
}
