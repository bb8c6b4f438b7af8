use thiserror::Error;

use crate::tiles::{Extent, TileIndex};

/// Everything that can go wrong while building the globe.
///
/// Geometry and bounds errors mean the caller passed bad numbers.
/// Tile errors abort startup, there is no partially textured globe.
#[derive(Debug, Error)]
pub enum GlobeError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(
        "region {width}x{height} at ({x}, {y}) exceeds atlas bounds {atlas_width}x{atlas_height}"
    )]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        atlas_width: u32,
        atlas_height: u32,
    },

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    PixelDataLength { expected: usize, actual: usize },

    #[error("no level {level} tiles cover extent {extent:?}")]
    EmptyCoverage { extent: Extent, level: u8 },

    #[error("failed to fetch tile {tile}: {reason}")]
    TileFetch { tile: TileIndex, reason: String },

    #[error("failed to decode tile {tile}")]
    Decode {
        tile: TileIndex,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "tile {tile} decoded to {width}x{height}, expected {expected_width}x{expected_height}"
    )]
    TileSize {
        tile: TileIndex,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}
