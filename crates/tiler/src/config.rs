//! Configuration for the tile service.

use renderer::{ImageFormat, SampleType};
use serde::{Deserialize, Serialize};

use crate::resample::ResamplingMethod;

/// Largest accepted output tile edge in pixels.
pub const MAX_TILE_SIZE: usize = 4096;

/// Defaults applied to tile requests plus service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilerConfig {
    /// Output tile edge in pixels.
    pub tile_size: usize,

    /// Resampling used when zoomed in past native resolution.
    pub resampling: ResamplingMethod,

    /// Output sample type.
    pub sample_type: SampleType,

    /// Encoded image format.
    pub format: ImageFormat,

    /// Number of datasets whose metadata is kept in memory.
    pub metadata_cache_capacity: usize,
}

impl Default for TilerConfig {
    fn default() -> Self {
        Self {
            tile_size: 256,
            resampling: ResamplingMethod::Nearest,
            sample_type: SampleType::U8,
            format: ImageFormat::Png,
            metadata_cache_capacity: 64,
        }
    }
}

impl TilerConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values are ignored and the default kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("TILE_SIZE") {
            if let Ok(size) = val.parse() {
                config.tile_size = size;
            }
        }

        if let Ok(val) = std::env::var("TILE_RESAMPLING") {
            if let Ok(method) = val.parse() {
                config.resampling = method;
            }
        }

        if let Ok(val) = std::env::var("TILE_SAMPLE_TYPE") {
            if let Ok(sample_type) = val.parse() {
                config.sample_type = sample_type;
            }
        }

        if let Ok(val) = std::env::var("TILE_FORMAT") {
            if let Ok(format) = val.parse() {
                config.format = format;
            }
        }

        if let Ok(val) = std::env::var("METADATA_CACHE_CAPACITY") {
            if let Ok(capacity) = val.parse() {
                config.metadata_cache_capacity = capacity;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.tile_size == 0 || self.tile_size > MAX_TILE_SIZE {
            return Err(format!("tile_size must be 1-{}", MAX_TILE_SIZE));
        }

        if self.metadata_cache_capacity == 0 {
            return Err("metadata_cache_capacity must be > 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = TilerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tile_size, 256);
        assert_eq!(config.resampling, ResamplingMethod::Nearest);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = TilerConfig {
            tile_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TilerConfig {
            metadata_cache_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: TilerConfig = serde_yaml::from_str("tile_size: 512\nresampling: bilinear\n").unwrap();
        assert_eq!(config.tile_size, 512);
        assert_eq!(config.resampling, ResamplingMethod::Bilinear);
        assert_eq!(config.metadata_cache_capacity, 64);
    }
}
