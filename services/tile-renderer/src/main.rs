//! Tile renderer CLI.
//!
//! Loads a dataset manifest, renders one z/x/y web mercator tile and writes
//! the encoded image. Output is staged under a request-unique name and
//! renamed into place, so concurrent renders never see partial files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use renderer::{ColorInterval, ColorPoint, Colormap, ImageFormat, RescalePair, SampleType};
use serde::de::DeserializeOwned;
use tile_common::{tms_to_xyz, TileCoord};
use tiler::{ManifestRasterStore, ResamplingMethod, TileService, TilerConfig};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "tile-renderer")]
#[command(about = "Render a web mercator tile from a raster dataset")]
struct Args {
    /// Dataset manifest (YAML or JSON)
    #[arg(short, long, env = "TILE_MANIFEST")]
    manifest: PathBuf,

    /// Dataset id within the manifest (default: the only dataset)
    #[arg(short, long)]
    dataset: Option<String>,

    /// Zoom level
    #[arg(short, long)]
    z: u32,

    /// Tile column
    #[arg(short, long)]
    x: u32,

    /// Tile row
    #[arg(short, long)]
    y: u32,

    /// Rows are counted from the bottom (TMS)
    #[arg(long)]
    tms: bool,

    /// Comma-separated 1-based band indices (default: all bands)
    #[arg(long, value_delimiter = ',')]
    bands: Option<Vec<usize>>,

    /// Linear stretch as min,max; repeat once per band or give once for all
    #[arg(long, value_parser = parse_rescale)]
    rescale: Vec<RescalePair>,

    /// Colormap file with [{min, max, color}] intervals
    #[arg(long, conflicts_with_all = ["colormap_points", "colormap_from_table"])]
    colormap_intervals: Option<PathBuf>,

    /// Colormap file with [{value, color}] control points
    #[arg(long, conflicts_with = "colormap_from_table")]
    colormap_points: Option<PathBuf>,

    /// Build the colormap from the band's attribute table
    #[arg(long)]
    colormap_from_table: bool,

    /// Resampling for zoomed-in tiles (near, bilinear)
    #[arg(long, env = "TILE_RESAMPLING")]
    resampling: Option<ResamplingMethod>,

    /// Output tile size in pixels
    #[arg(long, env = "TILE_SIZE")]
    tile_size: Option<usize>,

    /// Output sample type (u8, u16)
    #[arg(long, env = "TILE_SAMPLE_TYPE")]
    sample_type: Option<SampleType>,

    /// Output image format
    #[arg(long, env = "TILE_FORMAT")]
    format: Option<ImageFormat>,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

fn parse_rescale(s: &str) -> Result<RescalePair, String> {
    let (min, max) = s
        .split_once(',')
        .ok_or_else(|| format!("expected min,max, got '{}'", s))?;
    let min: f64 = min
        .trim()
        .parse()
        .map_err(|e| format!("invalid min '{}': {}", min, e))?;
    let max: f64 = max
        .trim()
        .parse()
        .map_err(|e| format!("invalid max '{}': {}", max, e))?;
    Ok(RescalePair::new(min, max))
}

/// Read a YAML or JSON file (by extension).
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
    } else {
        serde_yaml::from_str(&text).with_context(|| format!("Invalid YAML in {}", path.display()))
    }
}

fn load_colormap_file(intervals: Option<&Path>, points: Option<&Path>) -> Result<Option<Colormap>> {
    if let Some(path) = intervals {
        let intervals: Vec<ColorInterval> = read_document(path)?;
        return Ok(Some(Colormap::from_intervals(&intervals)?));
    }
    if let Some(path) = points {
        let points: Vec<ColorPoint> = read_document(path)?;
        return Ok(Some(Colormap::from_points(&points)?));
    }
    Ok(None)
}

fn build_config(args: &Args) -> Result<TilerConfig> {
    let mut config = TilerConfig::from_env();
    if let Some(resampling) = args.resampling {
        config.resampling = resampling;
    }
    if let Some(tile_size) = args.tile_size {
        config.tile_size = tile_size;
    }
    if let Some(sample_type) = args.sample_type {
        config.sample_type = sample_type;
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

/// Write `bytes` to `output` through a staging file named after the request.
async fn write_atomically(output: &Path, request_id: uuid::Uuid, bytes: &[u8]) -> Result<()> {
    let mut staging = output.as_os_str().to_owned();
    staging.push(format!(".{}.tmp", request_id));
    let staging = PathBuf::from(staging);

    tokio::fs::write(&staging, bytes)
        .await
        .with_context(|| format!("Failed to write {}", staging.display()))?;
    if let Err(e) = tokio::fs::rename(&staging, output).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e).with_context(|| format!("Failed to move tile into {}", output.display()));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    if args.json {
        fmt().with_env_filter(filter).with_target(true).json().init();
    } else {
        fmt().with_env_filter(filter).with_target(true).init();
    }

    let config = build_config(&args)?;

    let store = ManifestRasterStore::open_manifest(&args.manifest)
        .await
        .with_context(|| format!("Failed to load manifest {}", args.manifest.display()))?;
    let dataset = match &args.dataset {
        Some(id) => id.clone(),
        None => match store.dataset_ids().as_slice() {
            [only] => only.to_string(),
            ids => bail!("Manifest has {} datasets, pick one with --dataset", ids.len()),
        },
    };
    let service = TileService::new(Arc::new(store), config);

    let coord = if args.tms {
        tms_to_xyz(args.z, args.x, args.y)
    } else {
        TileCoord::new(args.z, args.x, args.y)
    };

    let mut request = service.request(coord);
    if let Some(bands) = &args.bands {
        request = request.with_bands(bands.clone());
    }
    if !args.rescale.is_empty() {
        request = request.with_rescale(args.rescale.clone());
    }

    let colormap = if args.colormap_from_table {
        let band = args.bands.as_ref().and_then(|b| b.first()).copied().unwrap_or(1);
        Some(service.colormap_from_attribute_table(&dataset, band).await?)
    } else {
        load_colormap_file(args.colormap_intervals.as_deref(), args.colormap_points.as_deref())?
            .map(Arc::new)
    };
    if let Some(colormap) = colormap {
        request = request.with_colormap(colormap);
    }

    info!(
        request_id = %request.request_id,
        dataset = %dataset,
        tile = %coord.cache_key(),
        "Rendering tile"
    );

    let bytes = service
        .render_tile_encoded(&dataset, &request, None)
        .await
        .with_context(|| format!("Failed to render tile {}", coord.cache_key()))?;
    write_atomically(&args.output, request.request_id, &bytes).await?;

    info!(
        output = %args.output.display(),
        bytes = bytes.len(),
        "Wrote tile"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rescale() {
        assert_eq!(parse_rescale("0,255").unwrap(), RescalePair::new(0.0, 255.0));
        assert_eq!(parse_rescale(" -1.5 , 2 ").unwrap(), RescalePair::new(-1.5, 2.0));
        assert!(parse_rescale("0").is_err());
        assert!(parse_rescale("a,1").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "tile-renderer",
            "--manifest",
            "datasets.yaml",
            "-z",
            "7",
            "-x",
            "115",
            "-y",
            "74",
            "--bands",
            "3,2,1",
            "--rescale",
            "0,1000",
            "--resampling",
            "bilinear",
            "--output",
            "tile.png",
        ])
        .unwrap();
        assert_eq!(args.bands, Some(vec![3, 2, 1]));
        assert_eq!(args.rescale, vec![RescalePair::new(0.0, 1000.0)]);
        assert_eq!(args.resampling, Some(ResamplingMethod::Bilinear));
    }

    #[test]
    fn test_load_interval_colormap_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.yaml");
        std::fs::write(
            &path,
            "- { min: 0, max: 0, color: [255, 255, 255, 255] }\n- { min: 1, max: 100, color: [255, 0, 0, 255] }\n",
        )
        .unwrap();

        let colormap = load_colormap_file(Some(&path), None).unwrap().unwrap();
        assert_eq!(colormap.len(), 100);
        assert_eq!(colormap.lookup(50.0), [255, 0, 0, 255]);
    }

    #[test]
    fn test_load_point_colormap_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.json");
        std::fs::write(
            &path,
            r#"[{"value": 0, "color": [0, 0, 0, 255]}, {"value": 10, "color": [100, 0, 0, 255]}]"#,
        )
        .unwrap();

        let colormap = load_colormap_file(None, Some(&path)).unwrap().unwrap();
        assert_eq!(colormap.len(), 11);
        assert_eq!(colormap.lookup(5.0), [50, 0, 0, 255]);
    }

    #[tokio::test]
    async fn test_write_atomically_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("tile.png");
        write_atomically(&output, uuid::Uuid::new_v4(), b"png").await.unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"png");
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
