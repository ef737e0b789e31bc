//! Row-major single-band pixel buffers and integer pixel rectangles.

use serde::{Deserialize, Serialize};

/// An integer rectangle in pixel space (columns/rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: usize,
    pub top: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelRect {
    pub fn new(left: usize, top: usize, width: usize, height: usize) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> usize {
        self.left + self.width
    }

    pub fn bottom(&self) -> usize {
        self.top + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when this rectangle lies fully inside a `width` x `height` area.
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}

/// A single band of pixel values in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl PixelBuffer {
    /// Wrap existing values. `data.len()` must equal `width * height`.
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self::new(width, height, vec![value; width * height])
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> f32 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize, value: f32) {
        self.data[row * self.width + col] = value;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copy out a sub-rectangle. The rectangle must fit inside the buffer.
    pub fn crop(&self, rect: &PixelRect) -> PixelBuffer {
        debug_assert!(rect.fits_within(self.width, self.height));
        let mut data = Vec::with_capacity(rect.width * rect.height);
        for row in rect.top..rect.bottom() {
            let start = row * self.width + rect.left;
            data.extend_from_slice(&self.data[start..start + rect.width]);
        }
        PixelBuffer::new(rect.width, rect.height, data)
    }
}
