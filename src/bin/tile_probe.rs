use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bevy_tileglobe::render::TextureAtlas;
use bevy_tileglobe::tiles::{load_tiles, open_tile_source};
use bevy_tileglobe::{GlobeConfig, GlobeError};

/// List the tiles the globe would request and optionally stitch them to a PNG.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Config file, defaults to $GLOBE_CONFIG or assets/config/globe.json
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Atlas edge in pixels, overrides earth.initial_resolution
    #[arg(short, long)]
    resolution: Option<u32>,

    /// Fetch and stitch the tiles instead of only listing them
    #[arg(short, long)]
    fetch: bool,

    /// Where to write the stitched atlas
    #[arg(short, long, default_value = "atlas.png")]
    out: PathBuf,
}

fn main() -> Result<(), GlobeError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => GlobeConfig::from_file(path)?,
        None => GlobeConfig::load()?,
    };
    if let Some(resolution) = args.resolution {
        config.earth.initial_resolution = resolution;
        config.validate()?;
    }

    let resolution = config.earth.initial_resolution;
    let source = open_tile_source(&config.map)?;
    let schema = source.schema();
    let map_resolution = config.map.extent.width() / resolution as f64;
    let infos = schema.tile_infos(&config.map.extent, map_resolution);

    println!(
        "{} tiles at level {} for a {resolution}x{resolution} atlas from {}",
        infos.len(),
        schema.nearest_level(map_resolution),
        source.describe()
    );
    for info in &infos {
        println!("  {}", info.index);
    }

    if !args.fetch {
        return Ok(());
    }

    let mut atlas = TextureAtlas::new(resolution, resolution)?;
    let report = load_tiles(&mut atlas, source.as_ref(), &config.map.extent)?;

    let pixels = atlas.pixels().to_vec();
    let image = image::RgbaImage::from_raw(atlas.width(), atlas.height(), pixels).ok_or_else(|| {
        GlobeError::InvalidParameter("atlas buffer does not match its size".into())
    })?;
    image.save(&args.out)?;

    println!(
        "stitched {} tiles ({}x{}) into {}",
        report.tile_count,
        report.columns,
        report.rows,
        args.out.display()
    );
    Ok(())
}
