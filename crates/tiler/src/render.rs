//! Rendering a single tile from a raster store.

use renderer::{compose_tile, OutputTile};
use tile_common::{tile_extent, PixelBuffer, TileError, TileResult};
use tracing::debug;

use crate::metadata::RasterMetadata;
use crate::request::TileRequest;
use crate::store::{DatasetHandle, RasterStore};
use crate::window::{plan_window, ReadPlan};

/// Render one tile of an opened dataset.
///
/// The request is validated before anything is read. Tiles that miss the
/// raster come back fully transparent. Bands are read one after another.
pub async fn render_tile<S: RasterStore + ?Sized>(
    store: &S,
    handle: &DatasetHandle,
    metadata: &RasterMetadata,
    request: &TileRequest,
) -> TileResult<OutputTile> {
    let resolved = request.resolve(metadata)?;
    let mut tile = OutputTile::new(request.tile_size, request.sample_type);

    let extent = tile_extent(&request.coord);
    let Some(plan) = plan_window(&extent, metadata, request.tile_size) else {
        debug!(tile = %request.coord.cache_key(), "Tile outside raster");
        return Ok(tile);
    };

    let mut buffers = Vec::with_capacity(resolved.bands.len());
    for &band in &resolved.bands {
        let buffer = read_band(store, handle, &plan, band, metadata.nodata(band), request).await?;
        if buffer.width != plan.dest.width || buffer.height != plan.dest.height {
            return Err(TileError::ReadFailed(format!(
                "band {} read as {}x{}, expected {}x{}",
                band, buffer.width, buffer.height, plan.dest.width, plan.dest.height
            )));
        }
        buffers.push(buffer);
    }

    let nodata: Vec<Option<f32>> = resolved.bands.iter().map(|&b| metadata.nodata(b)).collect();
    compose_tile(&mut tile, &plan.dest, &buffers, &nodata, &resolved.transform)?;
    Ok(tile)
}

async fn read_band<S: RasterStore + ?Sized>(
    store: &S,
    handle: &DatasetHandle,
    plan: &ReadPlan,
    band: usize,
    nodata: Option<f32>,
    request: &TileRequest,
) -> TileResult<PixelBuffer> {
    let overview = plan.level.index;

    if !plan.needs_resampling() {
        let out_size = (plan.dest.width, plan.dest.height);
        return Ok(store
            .read_window(handle, band, overview, plan.window, Some(out_size))
            .await?);
    }

    let read_margins = request.resampling.read_margins(&plan.window, &plan.level);
    let source = store
        .read_window(handle, band, overview, read_margins.expand(&plan.window), None)
        .await?;
    let crop = plan.crop_margins(&read_margins);

    Ok(request
        .resampling
        .resample(&source, plan.dest.width, plan.dest.height, &crop, nodata))
}
