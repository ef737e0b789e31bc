//! Compositing source bands into an RGBA output tile.
//!
//! Each band is written into the destination rectangle of a zero-filled
//! tile using one of three value transforms:
//! - pass-through (values copied, clamped to the sample range)
//! - linear rescale of a (min, max) range onto `[0, max output]`
//! - colormap lookup of a single band
//!
//! Pixels outside the destination rectangle keep the transparent fill.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tile_common::{PixelBuffer, PixelRect, TileError, TileResult};

use crate::colormap::Colormap;

/// Sample type of the output tile; defines the maximum channel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    #[default]
    U8,
    U16,
}

impl SampleType {
    pub fn max_value(&self) -> f64 {
        match self {
            SampleType::U8 => u8::MAX as f64,
            SampleType::U16 => u16::MAX as f64,
        }
    }

    pub fn bit_depth(&self) -> u8 {
        match self {
            SampleType::U8 => 8,
            SampleType::U16 => 16,
        }
    }
}

impl FromStr for SampleType {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "u8" | "uint8" | "byte" => Ok(SampleType::U8),
            "u16" | "uint16" => Ok(SampleType::U16),
            other => Err(TileError::Config(format!("unknown sample type '{}'", other))),
        }
    }
}

/// A linear stretch range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RescalePair {
    pub min: f64,
    pub max: f64,
}

impl RescalePair {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn validate(&self) -> TileResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.max <= self.min {
            return Err(TileError::InvalidRescaleRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Map `value` onto `[0, max_output]`, truncating toward zero.
    #[inline]
    pub fn apply(&self, value: f32, max_output: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        let scale = max_output / (self.max - self.min);
        let stretched = (f64::from(value) - self.min).max(0.0) * scale;
        stretched.clamp(0.0, max_output).trunc()
    }
}

/// How band values become output channel values.
#[derive(Debug, Clone, Default)]
pub enum ValueTransform {
    /// Copy values verbatim.
    #[default]
    None,
    /// One pair per band, or a single pair applied to every band.
    Rescale(Vec<RescalePair>),
    /// Single band through a lookup table.
    Colormap(Arc<Colormap>),
}

impl ValueTransform {
    /// Check the transform against the number of bands being rendered.
    pub fn validate(&self, band_count: usize) -> TileResult<()> {
        match self {
            ValueTransform::None => Ok(()),
            ValueTransform::Rescale(pairs) => {
                if pairs.len() != 1 && pairs.len() != band_count {
                    return Err(TileError::RescaleLengthMismatch {
                        pairs: pairs.len(),
                        bands: band_count,
                    });
                }
                pairs.iter().try_for_each(RescalePair::validate)
            }
            ValueTransform::Colormap(_) => {
                if band_count != 1 {
                    return Err(TileError::InvalidBandCount {
                        count: band_count,
                        colormap: true,
                    });
                }
                Ok(())
            }
        }
    }

    fn rescale_for_band(pairs: &[RescalePair], band: usize) -> RescalePair {
        if pairs.len() == 1 {
            pairs[0]
        } else {
            pairs[band]
        }
    }
}

/// Fixed-size RGBA output tile, channels interleaved, zero-initialised.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTile {
    size: usize,
    sample_type: SampleType,
    data: Vec<u16>,
}

impl OutputTile {
    pub const CHANNELS: usize = 4;

    /// A fully transparent tile.
    pub fn new(size: usize, sample_type: SampleType) -> Self {
        Self {
            size,
            sample_type,
            data: vec![0; size * size * Self::CHANNELS],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    /// Interleaved samples (R, G, B, A per pixel, row-major).
    pub fn data(&self) -> &[u16] {
        &self.data
    }

    pub fn pixel(&self, col: usize, row: usize) -> [u16; 4] {
        let i = (row * self.size + col) * Self::CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    #[inline]
    fn set_channel(&mut self, col: usize, row: usize, channel: usize, value: u16) {
        self.data[(row * self.size + col) * Self::CHANNELS + channel] = value;
    }

    pub fn is_fully_transparent(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    /// Samples narrowed to bytes; 16-bit tiles keep the high byte.
    pub fn to_rgba8(&self) -> Vec<u8> {
        match self.sample_type {
            SampleType::U8 => self.data.iter().map(|&v| v as u8).collect(),
            SampleType::U16 => self.data.iter().map(|&v| (v >> 8) as u8).collect(),
        }
    }
}

/// Composite resampled bands into `tile` at `dest`.
///
/// `bands` must each be exactly `dest.width` x `dest.height`. `nodata`
/// holds the configured nodata value of each band (same order). Band
/// layouts: one band renders grey, three bands render RGB, four bands
/// render RGBA with the fourth band as alpha. For fewer than four bands
/// (and no colormap) alpha is zero wherever any band equals its nodata
/// value, otherwise fully opaque.
pub fn compose_tile(
    tile: &mut OutputTile,
    dest: &PixelRect,
    bands: &[PixelBuffer],
    nodata: &[Option<f32>],
    transform: &ValueTransform,
) -> TileResult<()> {
    transform.validate(bands.len())?;
    if !matches!(bands.len(), 1 | 3 | 4) {
        return Err(TileError::InvalidBandCount {
            count: bands.len(),
            colormap: false,
        });
    }
    if !dest.fits_within(tile.size, tile.size) {
        return Err(TileError::ReadFailed(format!(
            "destination {:?} exceeds tile size {}",
            dest, tile.size
        )));
    }
    if let Some(bad) = bands
        .iter()
        .find(|b| b.width != dest.width || b.height != dest.height)
    {
        return Err(TileError::ReadFailed(format!(
            "band buffer is {}x{}, destination is {}x{}",
            bad.width, bad.height, dest.width, dest.height
        )));
    }

    let max_output = tile.sample_type.max_value();

    if let ValueTransform::Colormap(colormap) = transform {
        write_colormap(tile, dest, &bands[0], colormap, max_output);
        return Ok(());
    }

    for (band_idx, band) in bands.iter().enumerate() {
        let channels: &[usize] = match (bands.len(), band_idx) {
            (1, _) => &[0, 1, 2],
            (_, 0) => &[0],
            (_, 1) => &[1],
            (_, 2) => &[2],
            _ => &[3],
        };

        for row in 0..dest.height {
            for col in 0..dest.width {
                let value = band.get(col, row);
                let out = match transform {
                    ValueTransform::Rescale(pairs) => {
                        ValueTransform::rescale_for_band(pairs, band_idx).apply(value, max_output)
                    }
                    _ => pass_through(value, max_output),
                };
                for &channel in channels {
                    tile.set_channel(dest.left + col, dest.top + row, channel, out as u16);
                }
            }
        }
    }

    if bands.len() < 4 {
        write_nodata_alpha(tile, dest, bands, nodata, max_output as u16);
    }

    Ok(())
}

#[inline]
fn pass_through(value: f32, max_output: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        f64::from(value).clamp(0.0, max_output).trunc()
    }
}

#[inline]
fn is_nodata(value: f32, nodata: Option<f32>) -> bool {
    match nodata {
        Some(nd) if nd.is_nan() => value.is_nan(),
        Some(nd) => value == nd,
        None => false,
    }
}

fn write_colormap(
    tile: &mut OutputTile,
    dest: &PixelRect,
    band: &PixelBuffer,
    colormap: &Colormap,
    max_output: f64,
) {
    // Table entries are 8-bit; widen them onto the output range.
    let widen = max_output / 255.0;
    for row in 0..dest.height {
        for col in 0..dest.width {
            let rgba = colormap.lookup(band.get(col, row));
            for (channel, &v) in rgba.iter().enumerate() {
                let out = (f64::from(v) * widen) as u16;
                tile.set_channel(dest.left + col, dest.top + row, channel, out);
            }
        }
    }
}

fn write_nodata_alpha(
    tile: &mut OutputTile,
    dest: &PixelRect,
    bands: &[PixelBuffer],
    nodata: &[Option<f32>],
    opaque: u16,
) {
    for row in 0..dest.height {
        for col in 0..dest.width {
            let masked = bands
                .iter()
                .enumerate()
                .any(|(i, b)| is_nodata(b.get(col, row), nodata.get(i).copied().flatten()));
            let alpha = if masked { 0 } else { opaque };
            tile.set_channel(dest.left + col, dest.top + row, 3, alpha);
        }
    }
}
