//! Output image formats for rendered tiles.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tile_common::{TileError, TileResult};
use tracing::debug;

use crate::compose::{OutputTile, SampleType};
use crate::png;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
}

impl ImageFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" | "image/png" => Ok(ImageFormat::Png),
            other => Err(TileError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Encode a rendered tile.
pub fn encode(tile: &OutputTile, format: ImageFormat) -> TileResult<Vec<u8>> {
    let size = tile.size();
    let bytes = match (format, tile.sample_type()) {
        (ImageFormat::Png, SampleType::U8) => png::create_png_auto(&tile.to_rgba8(), size, size),
        (ImageFormat::Png, SampleType::U16) => png::create_png16(tile.data(), size, size),
    }
    .map_err(TileError::EncodeFailed)?;

    debug!(size, bytes = bytes.len(), ?format, "Encoded tile");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!("PNG".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert!(matches!(
            "jpeg".parse::<ImageFormat>(),
            Err(TileError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_encode_transparent_tile() {
        let tile = OutputTile::new(256, SampleType::U8);
        let bytes = encode(&tile, ImageFormat::Png).unwrap();
        assert_eq!(&bytes[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    }
}
