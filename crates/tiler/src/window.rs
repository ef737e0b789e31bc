//! Planning which source pixels to read for a tile and where they land.
//!
//! The tile's projected bounds are moved into full-resolution pixel space
//! with the inverse geotransform, clipped to the raster, scaled into the
//! selected overview and projected back onto the output tile. Everything
//! stays in floating point until the destination rectangle is rounded, so
//! neighbouring tiles meet without seams.

use tile_common::{pixel_to_display, pixel_to_display_f, BoundingBox, PixelRect};
use tracing::debug;

use crate::metadata::RasterMetadata;
use crate::overview::OverviewLevel;

/// Pixel counts on each side of a rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Margins {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl Margins {
    pub fn new(left: usize, top: usize, right: usize, bottom: usize) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Grow `rect` by these margins. Left and top must not exceed the
    /// rectangle's offset.
    pub fn expand(&self, rect: &PixelRect) -> PixelRect {
        PixelRect::new(
            rect.left - self.left,
            rect.top - self.top,
            rect.width + self.left + self.right,
            rect.height + self.top + self.bottom,
        )
    }
}

/// Where to read from and where the result goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadPlan {
    /// Resolution level to read from.
    pub level: OverviewLevel,
    /// Source window in the level's pixel space.
    pub window: PixelRect,
    /// Target rectangle inside the output tile.
    pub dest: PixelRect,
    /// Full-resolution pixels per output pixel.
    pub pixels_per_display_pixel: f64,
    /// Display pixels to shave off each side after resampling, so partial
    /// source pixels line up with the tile. Present only when the request
    /// is finer than the raster's native resolution.
    pub margins: Option<Margins>,
}

impl ReadPlan {
    /// True when the source has to be enlarged to the destination.
    pub fn needs_resampling(&self) -> bool {
        self.margins.is_some()
    }

    /// Display-space crop for a window read with `read_margins` extra
    /// source pixels on each side.
    pub fn crop_margins(&self, read_margins: &Margins) -> Margins {
        let base = self.margins.unwrap_or_default();
        let to_display = |m: usize| (m as f64 / self.pixels_per_display_pixel).round() as usize;
        Margins::new(
            base.left + to_display(read_margins.left),
            base.top + to_display(read_margins.top),
            base.right + to_display(read_margins.right),
            base.bottom + to_display(read_margins.bottom),
        )
    }
}

/// Plan the read for a tile with projected bounds `extent` and square
/// output size `tile_size`.
///
/// Returns `None` when the tile does not overlap the raster; the caller
/// then returns a fully transparent tile.
pub fn plan_window(
    extent: &BoundingBox,
    metadata: &RasterMetadata,
    tile_size: usize,
) -> Option<ReadPlan> {
    let gt = &metadata.geotransform;

    // Extent in full-resolution pixels
    let img_pix_x = (extent.right() - extent.left()) / gt.pixel_width();
    let img_pix_y = (extent.bottom() - extent.top()) / gt.pixel_height();

    let (orig_left, orig_top) = metadata.inverse.apply(extent.left(), extent.top());
    let orig_right = orig_left + img_pix_x;
    let orig_bottom = orig_top + img_pix_y;

    let pixels_per_display_pixel = img_pix_x / tile_size as f64;
    if !(pixels_per_display_pixel.is_finite() && pixels_per_display_pixel > 0.0)
        || !(img_pix_y > 0.0)
    {
        debug!(pixels_per_display_pixel, img_pix_y, "Degenerate pixel extent");
        return None;
    }

    let raster_w = metadata.width as f64;
    let raster_h = metadata.height as f64;

    // Each side is checked on its own
    if (orig_top < 0.0 && orig_bottom < 0.0)
        || (orig_left < 0.0 && orig_right < 0.0)
        || (orig_left > raster_w && orig_right > raster_w)
        || (orig_top > raster_h && orig_bottom > raster_h)
    {
        return None;
    }

    let level = *metadata.overviews.select_level(pixels_per_display_pixel);
    let factor = level.full_res_pixels_per_pixel;

    let pix_top = orig_top.max(0.0);
    let pix_left = orig_left.max(0.0);
    let pix_bottom = orig_bottom.min(raster_h);
    let pix_right = orig_right.min(raster_w);
    if pix_right <= pix_left || pix_bottom <= pix_top {
        return None;
    }

    let ov_top = (pix_top / factor) as usize;
    let ov_left = (pix_left / factor) as usize;
    let ov_bottom = ((pix_bottom / factor).ceil() as usize).min(level.height);
    let ov_right = ((pix_right / factor).ceil() as usize).min(level.width);
    if ov_right <= ov_left || ov_bottom <= ov_top {
        return None;
    }

    let (dsp_left, dsp_top) =
        pixel_to_display_f(pix_left, pix_top, orig_left, orig_top, pixels_per_display_pixel);
    let (dsp_right, dsp_bottom) =
        pixel_to_display_f(pix_right, pix_bottom, orig_left, orig_top, pixels_per_display_pixel);

    let clamp = |v: f64| (v.round() as i64).clamp(0, tile_size as i64);
    let dsp_left = clamp(dsp_left);
    let dsp_top = clamp(dsp_top);
    let dsp_right = clamp(dsp_right);
    let dsp_bottom = clamp(dsp_bottom);
    if dsp_right <= dsp_left || dsp_bottom <= dsp_top {
        return None;
    }

    let margins = (pixels_per_display_pixel < 1.0).then(|| {
        // Source reads are whole pixels; work out how much of the
        // enlarged result hangs over the destination on each side.
        let (abs_left, abs_top) = pixel_to_display(
            pix_left.floor(),
            pix_top.floor(),
            orig_left,
            orig_top,
            pixels_per_display_pixel,
        );
        let (abs_right, abs_bottom) = pixel_to_display(
            pix_right.ceil(),
            pix_bottom.ceil(),
            orig_left,
            orig_top,
            pixels_per_display_pixel,
        );
        let extra = |d: i64| ((d as f64 / factor) as i64).max(0) as usize;
        Margins::new(
            extra(dsp_left - abs_left),
            extra(dsp_top - abs_top),
            extra(abs_right - dsp_right),
            extra(abs_bottom - dsp_bottom),
        )
    });

    let plan = ReadPlan {
        level,
        window: PixelRect::new(ov_left, ov_top, ov_right - ov_left, ov_bottom - ov_top),
        dest: PixelRect::new(
            dsp_left as usize,
            dsp_top as usize,
            (dsp_right - dsp_left) as usize,
            (dsp_bottom - dsp_top) as usize,
        ),
        pixels_per_display_pixel,
        margins,
    };
    debug!(
        overview = level.index,
        window = ?plan.window,
        dest = ?plan.dest,
        pixels_per_display_pixel,
        "Planned tile read"
    );
    Some(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_common::GeoTransform;

    /// A 1000x1000 raster with 1m pixels whose top-left corner is (0, 1000).
    fn metadata(overviews: &[Vec<(usize, usize)>]) -> RasterMetadata {
        let gt = GeoTransform::north_up(0.0, 1000.0, 1.0, 1.0);
        RasterMetadata::new(1000, 1000, gt, vec![None], false, overviews).unwrap()
    }

    #[test]
    fn test_native_resolution_full_cover() {
        let meta = metadata(&[]);
        let extent = BoundingBox::from_edges(100.0, 900.0, 356.0, 644.0);
        let plan = plan_window(&extent, &meta, 256).unwrap();

        assert_eq!(plan.window, PixelRect::new(100, 100, 256, 256));
        assert_eq!(plan.dest, PixelRect::new(0, 0, 256, 256));
        assert_eq!(plan.pixels_per_display_pixel, 1.0);
        assert!(!plan.needs_resampling());
    }

    #[test]
    fn test_partial_overlap_left_edge() {
        let meta = metadata(&[]);
        // Half the tile sits left of the raster
        let extent = BoundingBox::from_edges(-128.0, 1000.0, 128.0, 744.0);
        let plan = plan_window(&extent, &meta, 256).unwrap();

        assert_eq!(plan.window, PixelRect::new(0, 0, 128, 256));
        assert_eq!(plan.dest, PixelRect::new(128, 0, 128, 256));
    }

    #[test]
    fn test_each_side_outside() {
        let meta = metadata(&[]);
        let cases = [
            BoundingBox::from_edges(-600.0, 900.0, -100.0, 400.0), // left
            BoundingBox::from_edges(1100.0, 900.0, 1600.0, 400.0), // right
            BoundingBox::from_edges(100.0, 1600.0, 600.0, 1100.0), // above
            BoundingBox::from_edges(100.0, -100.0, 600.0, -600.0), // below
        ];
        for extent in cases {
            assert!(plan_window(&extent, &meta, 256).is_none(), "{:?}", extent);
        }
    }

    #[test]
    fn test_touching_edge_is_no_overlap() {
        let meta = metadata(&[]);
        let extent = BoundingBox::from_edges(1000.0, 900.0, 1256.0, 644.0);
        assert!(plan_window(&extent, &meta, 256).is_none());
    }

    #[test]
    fn test_coarse_request_uses_overview() {
        let meta = metadata(&[vec![(500, 500), (250, 250)]]);
        // 1000 pixels onto 250: four full-res pixels per output pixel
        let extent = BoundingBox::from_edges(0.0, 1000.0, 1000.0, 0.0);
        let plan = plan_window(&extent, &meta, 250).unwrap();

        assert_eq!(plan.level.index, 2);
        assert_eq!(plan.window, PixelRect::new(0, 0, 250, 250));
        assert_eq!(plan.dest, PixelRect::new(0, 0, 250, 250));
    }

    #[test]
    fn test_zoomed_in_computes_margins() {
        let meta = metadata(&[]);
        // 64 pixels onto 256 at 0.25 pixels per output pixel, starting
        // half way into pixel 10
        let extent = BoundingBox::from_edges(10.5, 989.5, 74.5, 925.5);
        let plan = plan_window(&extent, &meta, 256).unwrap();

        assert!(plan.needs_resampling());
        assert_eq!(plan.window, PixelRect::new(10, 10, 65, 65));
        assert_eq!(plan.dest, PixelRect::new(0, 0, 256, 256));
        let margins = plan.margins.unwrap();
        // Half a source pixel is two display pixels at 0.25
        assert_eq!(margins.left, 2);
        assert_eq!(margins.top, 2);
        assert_eq!(margins.right, 2);
        assert_eq!(margins.bottom, 2);
    }

    #[test]
    fn test_crop_margins_adds_read_margins() {
        let meta = metadata(&[]);
        let extent = BoundingBox::from_edges(10.5, 989.5, 74.5, 925.5);
        let plan = plan_window(&extent, &meta, 256).unwrap();

        let crop = plan.crop_margins(&Margins::new(1, 1, 1, 0));
        assert_eq!(crop, Margins::new(6, 6, 6, 2));
    }

    #[test]
    fn test_margins_expand() {
        let rect = PixelRect::new(10, 20, 30, 40);
        assert_eq!(
            Margins::new(1, 2, 3, 4).expand(&rect),
            PixelRect::new(9, 18, 34, 46)
        );
    }
}
