//! Synthetic band generators.
//!
//! These generators create predictable, verifiable pixel patterns that can
//! be used across the test suite.

use tile_common::PixelBuffer;

/// Creates a band with predictable values.
///
/// Each pixel value is calculated as: `col * 1000 + row`
///
/// This makes it easy to verify that windows are read from the right place
/// by checking that `band.get(col, row) == col * 1000 + row`.
///
/// # Example
///
/// ```
/// use test_utils::create_indexed_band;
///
/// let band = create_indexed_band(10, 5);
/// assert_eq!(band.len(), 50);
/// assert_eq!(band.get(1, 0), 1000.0);
/// assert_eq!(band.get(0, 1), 1.0);
/// ```
pub fn create_indexed_band(width: usize, height: usize) -> PixelBuffer {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    PixelBuffer::new(width, height, data)
}

/// Creates a diagonal gradient from `min` (top-left) to `max` (bottom-right).
pub fn create_gradient_band(width: usize, height: usize, min: f32, max: f32) -> PixelBuffer {
    let span = (width + height).saturating_sub(2).max(1) as f32;
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let t = (col + row) as f32 / span;
            data.push(min + t * (max - min));
        }
    }
    PixelBuffer::new(width, height, data)
}

/// Creates a checkerboard of `cell`-sized squares alternating `low` and `high`.
pub fn create_checkerboard_band(
    width: usize,
    height: usize,
    cell: usize,
    low: f32,
    high: f32,
) -> PixelBuffer {
    let cell = cell.max(1);
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let even = (col / cell + row / cell) % 2 == 0;
            data.push(if even { low } else { high });
        }
    }
    PixelBuffer::new(width, height, data)
}

/// Creates a band with every pixel set to `value`.
pub fn create_constant_band(width: usize, height: usize, value: f32) -> PixelBuffer {
    PixelBuffer::filled(width, height, value)
}

/// Creates a band with nodata pixels at regular intervals.
///
/// Every `nodata_interval`-th pixel (row-major) is set to `nodata`; the
/// rest follow the gradient of [`create_gradient_band`] between 0 and 255.
pub fn create_band_with_nodata(
    width: usize,
    height: usize,
    nodata: f32,
    nodata_interval: usize,
) -> PixelBuffer {
    let mut band = create_gradient_band(width, height, 0.0, 255.0);
    if nodata_interval > 0 {
        for (i, value) in band.data.iter_mut().enumerate() {
            if i % nodata_interval == 0 {
                *value = nodata;
            }
        }
    }
    band
}

/// Three bands of an RGB image: horizontal red ramp, vertical green ramp,
/// constant blue.
pub fn create_rgb_bands(width: usize, height: usize) -> Vec<PixelBuffer> {
    let mut red = Vec::with_capacity(width * height);
    let mut green = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            red.push((col * 255 / width.max(1)) as f32);
            green.push((row * 255 / height.max(1)) as f32);
        }
    }
    vec![
        PixelBuffer::new(width, height, red),
        PixelBuffer::new(width, height, green),
        create_constant_band(width, height, 128.0),
    ]
}
