use crate::error::GlobeError;
use crate::render::atlas::TextureAtlas;
use crate::tiles::schema::{Extent, TileInfo};
use crate::tiles::source::TileSource;

/// Summary of a completed tile load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub level: u8,
    pub tile_count: usize,
    pub columns: u32,
    pub rows: u32,
}

struct DecodedTile {
    info: TileInfo,
    x: u32,
    y: u32,
    pixels: image::RgbaImage,
}

/// Fetch every tile covering `extent` at the atlas's resolution and stitch
/// them into `atlas`.
///
/// Tiles are fetched and decoded one after the other. Nothing is written
/// until every tile has decoded and fits, so on error the atlas is exactly
/// as it was before the call.
pub fn load_tiles(
    atlas: &mut TextureAtlas,
    source: &dyn TileSource,
    extent: &Extent,
) -> Result<LoadReport, GlobeError> {
    let schema = source.schema();
    let resolution = extent.width() / atlas.width() as f64;
    let infos = schema.tile_infos(extent, resolution);

    let level = schema.nearest_level(resolution);
    let Some(first) = infos.first() else {
        return Err(GlobeError::EmptyCoverage {
            extent: *extent,
            level,
        });
    };

    let min_col = first.index.col;
    let min_row = first.index.row;
    let max_col = infos.iter().map(|t| t.index.col).max().unwrap_or(min_col);
    let max_row = infos.iter().map(|t| t.index.row).max().unwrap_or(min_row);

    tracing::info!(
        source = %source.describe(),
        level,
        resolution,
        tiles = infos.len(),
        "loading map tiles"
    );

    let tile_size = schema.tile_size();
    let mut decoded = Vec::with_capacity(infos.len());
    for info in infos {
        let bytes = source.fetch_tile(&info)?;
        let pixels = decode_tile(&info, &bytes, tile_size)?;

        let x = tile_size * (info.index.col - min_col);
        let y = tile_size * (info.index.row - min_row);
        atlas.check_bounds(x, y, tile_size, tile_size)?;

        tracing::debug!(tile = %info.index, x, y, "decoded tile");
        decoded.push(DecodedTile { info, x, y, pixels });
    }

    for tile in &decoded {
        atlas.update_region(tile.pixels.as_raw(), tile.x, tile.y, tile_size, tile_size)?;
    }

    let report = LoadReport {
        level,
        tile_count: decoded.len(),
        columns: max_col - min_col + 1,
        rows: max_row - min_row + 1,
    };
    tracing::info!(
        level = report.level,
        tiles = report.tile_count,
        columns = report.columns,
        rows = report.rows,
        last = %decoded.last().map(|t| t.info.index.to_string()).unwrap_or_default(),
        "map tiles stitched into atlas"
    );

    Ok(report)
}

/// Decode compressed tile bytes into RGBA8 and check the size.
fn decode_tile(
    info: &TileInfo,
    bytes: &[u8],
    tile_size: u32,
) -> Result<image::RgbaImage, GlobeError> {
    let pixels = image::load_from_memory(bytes)
        .map_err(|source| GlobeError::Decode {
            tile: info.index,
            source,
        })?
        .to_rgba8();

    let (width, height) = pixels.dimensions();
    if width != tile_size || height != tile_size {
        return Err(GlobeError::TileSize {
            tile: info.index,
            width,
            height,
            expected_width: tile_size,
            expected_height: tile_size,
        });
    }

    Ok(pixels)
}
