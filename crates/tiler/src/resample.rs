//! Enlarging source windows to the destination size.
//!
//! Used only when a tile is finer than the raster's native resolution.
//! Both methods take the margin bookkeeping from the read plan: the source
//! is enlarged to `dest + crop margins` and the margins are cut away again,
//! so partially covered source pixels land where they belong.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tile_common::{PixelBuffer, PixelRect, TileError};

use crate::overview::OverviewLevel;
use crate::window::Margins;

/// Resampling method for zoomed-in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResamplingMethod {
    /// Pixel replication.
    #[default]
    #[serde(alias = "near")]
    Nearest,
    /// Bilinear interpolation over a one pixel wider window.
    Bilinear,
}

impl ResamplingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nearest => "near",
            Self::Bilinear => "bilinear",
        }
    }

    /// Extra source pixels to read around `window` on each side.
    ///
    /// Bilinear asks for one pixel wherever the level has room for it.
    pub fn read_margins(&self, window: &PixelRect, level: &OverviewLevel) -> Margins {
        match self {
            Self::Nearest => Margins::default(),
            Self::Bilinear => Margins::new(
                window.left.min(1),
                window.top.min(1),
                level.width.saturating_sub(window.right()).min(1),
                level.height.saturating_sub(window.bottom()).min(1),
            ),
        }
    }

    /// Resample `source` to `width` x `height`, cropping `crop` display
    /// pixels from the enlarged result.
    pub fn resample(
        &self,
        source: &PixelBuffer,
        width: usize,
        height: usize,
        crop: &Margins,
        nodata: Option<f32>,
    ) -> PixelBuffer {
        match self {
            Self::Nearest => replicate(source, width, height, crop),
            Self::Bilinear => bilinear_resample(source, width, height, crop, nodata),
        }
    }
}

impl FromStr for ResamplingMethod {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "near" | "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            _ => Err(TileError::UnknownResamplingMethod(s.to_string())),
        }
    }
}

impl fmt::Display for ResamplingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Nearest-neighbour enlargement by pixel replication.
///
/// The replication factor covers the destination plus the crop margins;
/// output pixel `(c, r)` takes source pixel
/// `((c + crop.left) * cols / col_count, (r + crop.top) * rows / row_count)`.
pub fn replicate(source: &PixelBuffer, width: usize, height: usize, crop: &Margins) -> PixelBuffer {
    if source.is_empty() {
        return PixelBuffer::filled(width, height, 0.0);
    }

    let rows = source.height;
    let cols = source.width;
    let rpts_x = (width + crop.left + crop.right) as f64 / cols as f64;
    let rpts_y = (height + crop.top + crop.bottom) as f64 / rows as f64;
    let col_count = (cols as f64 * rpts_x).ceil() as usize;
    let row_count = (rows as f64 * rpts_y).ceil() as usize;

    let col_scale = cols as f64 / col_count as f64;
    let row_scale = rows as f64 / row_count as f64;

    let col_lookup: Vec<usize> = (0..width)
        .map(|c| (((c + crop.left) as f64 * col_scale) as usize).min(cols - 1))
        .collect();

    let mut data = Vec::with_capacity(width * height);
    for r in 0..height {
        let src_row = (((r + crop.top) as f64 * row_scale) as usize).min(rows - 1);
        let row = &source.data[src_row * cols..(src_row + 1) * cols];
        data.extend(col_lookup.iter().map(|&c| row[c]));
    }

    PixelBuffer::new(width, height, data)
}

/// Bilinear enlargement followed by the margin crop.
pub fn bilinear_resample(
    source: &PixelBuffer,
    width: usize,
    height: usize,
    crop: &Margins,
    nodata: Option<f32>,
) -> PixelBuffer {
    let full_width = width + crop.left + crop.right;
    let full_height = height + crop.top + crop.bottom;
    let enlarged = bilinear_kernel(source, nodata, full_width, full_height);
    enlarged.crop(&PixelRect::new(crop.left, crop.top, width, height))
}

/// Resize `source` to `out_width` x `out_height` with bilinear weights.
///
/// Pixel centres are aligned (`src = (dst + 0.5) * scale - 0.5`) and
/// neighbours are clamped to the buffer. With a nodata value, nodata
/// neighbours get no weight and a pixel with no weighted valid neighbour
/// becomes nodata.
pub fn bilinear_kernel(
    source: &PixelBuffer,
    nodata: Option<f32>,
    out_width: usize,
    out_height: usize,
) -> PixelBuffer {
    let fill = nodata.unwrap_or(0.0);
    if source.is_empty() {
        return PixelBuffer::filled(out_width, out_height, fill);
    }

    let in_w = source.width;
    let in_h = source.height;
    let scale_x = in_w as f64 / out_width.max(1) as f64;
    let scale_y = in_h as f64 / out_height.max(1) as f64;

    let x_taps: Vec<Tap> = (0..out_width).map(|x| Tap::new(x, scale_x, in_w)).collect();
    let is_nodata = |v: f32| match nodata {
        Some(nd) if nd.is_nan() => v.is_nan(),
        Some(nd) => v == nd,
        None => false,
    };

    let mut data = Vec::with_capacity(out_width * out_height);
    for y in 0..out_height {
        let ty = Tap::new(y, scale_y, in_h);
        let row0 = &source.data[ty.i0 * in_w..(ty.i0 + 1) * in_w];
        let row1 = &source.data[ty.i1 * in_w..(ty.i1 + 1) * in_w];

        for tx in &x_taps {
            let corners = [
                (row0[tx.i0], (1.0 - tx.frac) * (1.0 - ty.frac)),
                (row0[tx.i1], tx.frac * (1.0 - ty.frac)),
                (row1[tx.i0], (1.0 - tx.frac) * ty.frac),
                (row1[tx.i1], tx.frac * ty.frac),
            ];

            let value = if nodata.is_some() {
                let mut sum = 0.0f64;
                let mut weight = 0.0f64;
                for &(v, w) in &corners {
                    if w > 0.0 && !is_nodata(v) {
                        sum += f64::from(v) * w;
                        weight += w;
                    }
                }
                if weight > 0.0 {
                    (sum / weight) as f32
                } else {
                    fill
                }
            } else {
                corners
                    .iter()
                    .map(|&(v, w)| f64::from(v) * w)
                    .sum::<f64>() as f32
            };
            data.push(value);
        }
    }

    PixelBuffer::new(out_width, out_height, data)
}

/// Source neighbours and weight for one output coordinate.
#[derive(Debug, Clone, Copy)]
struct Tap {
    i0: usize,
    i1: usize,
    frac: f64,
}

impl Tap {
    fn new(dst: usize, scale: f64, len: usize) -> Self {
        let src = ((dst as f64 + 0.5) * scale - 0.5).max(0.0);
        let i0 = (src.floor() as usize).min(len - 1);
        let i1 = (i0 + 1).min(len - 1);
        let frac = (src - i0 as f64).clamp(0.0, 1.0);
        Self { i0, i1, frac }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> PixelBuffer {
        PixelBuffer::new(width, height, (0..width * height).map(|v| v as f32).collect())
    }

    #[test]
    fn test_parse_method() {
        assert_eq!("near".parse::<ResamplingMethod>().unwrap(), ResamplingMethod::Nearest);
        assert_eq!("Nearest".parse::<ResamplingMethod>().unwrap(), ResamplingMethod::Nearest);
        assert_eq!("BILINEAR".parse::<ResamplingMethod>().unwrap(), ResamplingMethod::Bilinear);
        assert!(matches!(
            "cubic".parse::<ResamplingMethod>(),
            Err(TileError::UnknownResamplingMethod(ref m)) if m == "cubic"
        ));
    }

    #[test]
    fn test_nearest_identity() {
        let src = ramp(7, 5);
        let out = replicate(&src, 7, 5, &Margins::default());
        assert_eq!(out, src);
    }

    #[test]
    fn test_bilinear_identity() {
        let src = ramp(7, 5);
        let out = bilinear_resample(&src, 7, 5, &Margins::default(), None);
        assert_eq!(out, src);

        let with_nodata = bilinear_resample(&src, 7, 5, &Margins::default(), Some(3.0));
        assert_eq!(with_nodata, src);
    }

    #[test]
    fn test_nearest_doubles() {
        let src = PixelBuffer::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        let out = replicate(&src, 4, 4, &Margins::default());
        assert_eq!(
            out.data,
            vec![
                1.0, 1.0, 2.0, 2.0, //
                1.0, 1.0, 2.0, 2.0, //
                3.0, 3.0, 4.0, 4.0, //
                3.0, 3.0, 4.0, 4.0,
            ]
        );
    }

    #[test]
    fn test_nearest_crops_margins() {
        // 3 source pixels to 12 display pixels, skipping 2 on the left and
        // 2 on the right leaves 8 columns.
        let src = PixelBuffer::new(3, 1, vec![1.0, 2.0, 3.0]);
        let out = replicate(&src, 8, 1, &Margins::new(2, 0, 2, 0));
        assert_eq!(out.data, vec![1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_bilinear_output_size_includes_crop() {
        let src = ramp(4, 4);
        let out = bilinear_resample(&src, 10, 6, &Margins::new(1, 2, 3, 4), None);
        assert_eq!((out.width, out.height), (10, 6));
        assert_eq!(out.len(), 60);
    }

    #[test]
    fn test_bilinear_interpolates_between_pixels() {
        let src = PixelBuffer::new(2, 1, vec![0.0, 100.0]);
        let out = bilinear_kernel(&src, None, 4, 1);
        // Centres at source x = -0.25, 0.25, 0.75, 1.25
        assert_eq!(out.data, vec![0.0, 25.0, 75.0, 100.0]);
    }

    #[test]
    fn test_bilinear_skips_nodata_neighbours() {
        let src = PixelBuffer::new(2, 1, vec![-9999.0, 100.0]);
        let out = bilinear_kernel(&src, Some(-9999.0), 4, 1);
        assert_eq!(out.data, vec![-9999.0, 100.0, 100.0, 100.0]);
    }

    #[test]
    fn test_read_margins() {
        let level = OverviewLevel::full_resolution(100, 100);
        let inner = PixelRect::new(10, 10, 20, 20);
        assert_eq!(
            ResamplingMethod::Bilinear.read_margins(&inner, &level),
            Margins::new(1, 1, 1, 1)
        );

        let corner = PixelRect::new(0, 0, 100, 50);
        assert_eq!(
            ResamplingMethod::Bilinear.read_margins(&corner, &level),
            Margins::new(0, 0, 0, 1)
        );
        assert!(ResamplingMethod::Nearest.read_margins(&inner, &level).is_zero());
    }
}
