//! Dense colour lookup tables for single-band rasters.
//!
//! A [`Colormap`] holds `K` RGBA entries and is indexed by the (clamped)
//! integer pixel value. Tables are built once per request from either
//! labelled intervals, interpolated control points, or a raster attribute
//! table.

use serde::{Deserialize, Serialize};
use tile_common::{TileError, TileResult};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Channel by index (0 = R, 1 = G, 2 = B, 3 = A).
    pub fn channel(&self, index: usize) -> u8 {
        match index {
            0 => self.r,
            1 => self.g,
            2 => self.b,
            _ => self.a,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Color {
    fn from(rgba: [u8; 4]) -> Self {
        Self::new(rgba[0], rgba[1], rgba[2], rgba[3])
    }
}

impl From<Color> for [u8; 4] {
    fn from(color: Color) -> Self {
        color.to_array()
    }
}

/// A colour assigned to the half-open value range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorInterval {
    pub min: u32,
    pub max: u32,
    pub color: Color,
}

impl ColorInterval {
    pub fn new(min: u32, max: u32, color: Color) -> Self {
        Self { min, max, color }
    }
}

/// A colour anchored at a single value; colours between points are interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorPoint {
    pub value: u32,
    pub color: Color,
}

impl ColorPoint {
    pub fn new(value: u32, color: Color) -> Self {
        Self { value, color }
    }
}

/// How a raster attribute table column is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnUsage {
    Red,
    Green,
    Blue,
    Alpha,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeColumn {
    pub name: String,
    pub usage: ColumnUsage,
    pub values: Vec<f64>,
}

/// Raster attribute table of a thematic band, one row per class value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeTable {
    pub columns: Vec<AttributeColumn>,
}

impl AttributeTable {
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.values.len()).max().unwrap_or(0)
    }

    pub fn column_of_usage(&self, usage: ColumnUsage) -> Option<&AttributeColumn> {
        self.columns.iter().find(|c| c.usage == usage)
    }
}

/// A 4 x K lookup table (R, G, B, A rows).
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    entries: Vec<[u8; 4]>,
}

impl Colormap {
    /// Wrap pre-built entries. An empty table is rejected.
    pub fn from_entries(entries: Vec<[u8; 4]>) -> TileResult<Self> {
        if entries.is_empty() {
            return Err(TileError::InvalidColormap("colormap has no entries".to_string()));
        }
        Ok(Self { entries })
    }

    /// Build a table from intervals sorted by value.
    ///
    /// The table has `max` of the last interval entries and each interval
    /// fills `[min, max)`, so adjacent intervals must share boundary values.
    /// Entries not covered by any interval are left transparent black.
    pub fn from_intervals(intervals: &[ColorInterval]) -> TileResult<Self> {
        let last = intervals
            .last()
            .ok_or_else(|| TileError::InvalidColormap("no intervals supplied".to_string()))?;

        for pair in intervals.windows(2) {
            if pair[1].min < pair[0].min {
                return Err(TileError::InvalidColormap(format!(
                    "intervals are not sorted: {} follows {}",
                    pair[1].min, pair[0].min
                )));
            }
        }
        if let Some(bad) = intervals.iter().find(|i| i.min > i.max) {
            return Err(TileError::InvalidColormap(format!(
                "interval min {} exceeds max {}",
                bad.min, bad.max
            )));
        }

        let size = last.max as usize;
        let mut entries = vec![[0u8; 4]; size];
        for interval in intervals {
            let start = (interval.min as usize).min(size);
            let end = (interval.max as usize).min(size);
            entries[start..end].fill(interval.color.to_array());
        }

        Self::from_entries(entries)
    }

    /// Build a table from control points sorted by value.
    ///
    /// The table covers `[0, last value]`; each channel is interpolated
    /// piecewise-linearly between points and held constant before the first
    /// point. Interpolated values are truncated to integers.
    pub fn from_points(points: &[ColorPoint]) -> TileResult<Self> {
        let last = points
            .last()
            .ok_or_else(|| TileError::InvalidColormap("no points supplied".to_string()))?;

        for pair in points.windows(2) {
            if pair[1].value < pair[0].value {
                return Err(TileError::InvalidColormap(format!(
                    "points are not sorted: {} follows {}",
                    pair[1].value, pair[0].value
                )));
            }
        }

        let size = last.value as usize + 1;
        let mut entries = Vec::with_capacity(size);
        // Index of the last point at or below the current value
        let mut seg = 0usize;

        for value in 0..size {
            let v = value as f64;
            while seg + 1 < points.len() && f64::from(points[seg + 1].value) <= v {
                seg += 1;
            }

            let lo = &points[seg];
            let entry = if v <= f64::from(lo.value) || seg + 1 == points.len() {
                lo.color.to_array()
            } else {
                let hi = &points[seg + 1];
                let t = (v - f64::from(lo.value)) / f64::from(hi.value - lo.value);
                let mut rgba = [0u8; 4];
                for (c, out) in rgba.iter_mut().enumerate() {
                    let a = f64::from(lo.color.channel(c));
                    let b = f64::from(hi.color.channel(c));
                    *out = (a + (b - a) * t) as u8;
                }
                rgba
            };
            entries.push(entry);
        }

        Self::from_entries(entries)
    }

    /// Build a table from the colour columns of a raster attribute table.
    ///
    /// Red, green and blue columns are required; a missing alpha column
    /// means fully opaque.
    pub fn from_attribute_table(table: &AttributeTable) -> TileResult<Self> {
        let column = |usage: ColumnUsage| {
            table.column_of_usage(usage).ok_or_else(|| {
                TileError::UnsupportedColormapSource(format!(
                    "attribute table has no {:?} column",
                    usage
                ))
            })
        };
        let red = column(ColumnUsage::Red)?;
        let green = column(ColumnUsage::Green)?;
        let blue = column(ColumnUsage::Blue)?;
        let alpha = table.column_of_usage(ColumnUsage::Alpha);

        let rows = table.row_count();
        if rows == 0 {
            return Err(TileError::UnsupportedColormapSource(
                "attribute table has no rows".to_string(),
            ));
        }

        let sample = |col: &AttributeColumn, row: usize, default: u8| -> u8 {
            col.values
                .get(row)
                .map(|v| v.clamp(0.0, 255.0) as u8)
                .unwrap_or(default)
        };

        let entries = (0..rows)
            .map(|row| {
                [
                    sample(red, row, 0),
                    sample(green, row, 0),
                    sample(blue, row, 0),
                    alpha.map(|a| sample(a, row, 255)).unwrap_or(255),
                ]
            })
            .collect();

        Self::from_entries(entries)
    }

    /// Number of entries (K).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Table shape as (channels, entries).
    pub fn shape(&self) -> (usize, usize) {
        (4, self.entries.len())
    }

    pub fn entry(&self, index: usize) -> Option<[u8; 4]> {
        self.entries.get(index).copied()
    }

    /// One row of the table (0 = R, 1 = G, 2 = B, 3 = A).
    pub fn channel(&self, channel: usize) -> Vec<u8> {
        self.entries.iter().map(|e| e[channel.min(3)]).collect()
    }

    /// Look up a pixel value, clamping it to `[0, K-1]`. NaN maps to entry 0.
    #[inline]
    pub fn lookup(&self, value: f32) -> [u8; 4] {
        let max_index = self.entries.len() - 1;
        let index = if value.is_nan() || value <= 0.0 {
            0
        } else {
            (value as usize).min(max_index)
        };
        self.entries[index]
    }
}
