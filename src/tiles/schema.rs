use std::fmt;

use serde::Deserialize;

use crate::error::GlobeError;

/// Half the circumference of the Web-Mercator sphere, in metres.
pub const WEB_MERCATOR_HALF_WIDTH: f64 = 20_037_508.342_789_244;
pub const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

pub const WEB_MERCATOR_EXTENT: Extent = Extent {
    min_x: -WEB_MERCATOR_HALF_WIDTH,
    min_y: -WEB_MERCATOR_HALF_WIDTH,
    max_x: WEB_MERCATOR_HALF_WIDTH,
    max_y: WEB_MERCATOR_HALF_WIDTH,
};

/// Axis aligned rectangle in projected (Web-Mercator) metres.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn intersection(&self, other: &Extent) -> Option<Extent> {
        let clipped = Extent {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        };
        (clipped.width() > 0.0 && clipped.height() > 0.0).then_some(clipped)
    }

    /// Projected point at texture coordinate (u, v), v growing downwards.
    pub fn point_at(&self, u: f64, v: f64) -> (f64, f64) {
        (self.min_x + u * self.width(), self.max_y - v * self.height())
    }
}

/// Inverse spherical Mercator, returns (latitude, longitude) in degrees.
pub fn web_mercator_to_lat_lon(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / WEB_MERCATOR_RADIUS).to_degrees();
    let lat = (2.0 * (y / WEB_MERCATOR_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2)
        .to_degrees();
    (lat, lon)
}

/// Address of a tile in the pyramid. Row 0 is the northmost row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileIndex {
    pub level: u8,
    pub col: u32,
    pub row: u32,
}

impl TileIndex {
    pub fn new(level: u8, col: u32, row: u32) -> Self {
        Self { level, col, row }
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.col, self.row)
    }
}

/// Tile descriptor handed out by a schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileInfo {
    pub index: TileIndex,
    pub extent: Extent,
}

/// Global square tile pyramid. Level `z` holds `2^z` x `2^z` tiles of
/// `tile_size` pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSchema {
    extent: Extent,
    tile_size: u32,
    resolutions: Vec<f64>,
}

impl TileSchema {
    pub fn new(extent: Extent, tile_size: u32, max_level: u8) -> Result<Self, GlobeError> {
        if tile_size == 0 {
            return Err(GlobeError::InvalidParameter("tile_size must be > 0".into()));
        }
        if !(extent.width() > 0.0 && extent.height() > 0.0) {
            return Err(GlobeError::InvalidParameter(format!(
                "schema extent is empty: {extent:?}"
            )));
        }
        // 2^31 tiles per side is already absurd
        if max_level > 30 {
            return Err(GlobeError::InvalidParameter(format!(
                "max_level {max_level} is too deep"
            )));
        }

        let resolutions = (0..=max_level)
            .map(|z| extent.width() / (tile_size as f64 * (1u64 << z) as f64))
            .collect();

        Ok(Self {
            extent,
            tile_size,
            resolutions,
        })
    }

    /// The usual XYZ pyramid over the whole Web-Mercator square.
    pub fn global_mercator(tile_size: u32, max_level: u8) -> Result<Self, GlobeError> {
        Self::new(WEB_MERCATOR_EXTENT, tile_size, max_level)
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn max_level(&self) -> u8 {
        (self.resolutions.len() - 1) as u8
    }

    /// Metres per pixel at `level`.
    pub fn resolution(&self, level: u8) -> Option<f64> {
        self.resolutions.get(level as usize).copied()
    }

    /// Tiles per side at `level`.
    pub fn matrix_size(&self, level: u8) -> u32 {
        1u32 << level.min(31)
    }

    /// Level whose resolution is closest to `resolution` (compared in log space).
    pub fn nearest_level(&self, resolution: f64) -> u8 {
        let target = resolution.max(f64::MIN_POSITIVE).ln();
        self.resolutions
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = (a.ln() - target).abs();
                let db = (b.ln() - target).abs();
                da.total_cmp(&db)
            })
            .map(|(z, _)| z as u8)
            .unwrap_or(0)
    }

    /// Every tile intersecting `extent` at the level nearest to `resolution`,
    /// row-major from the top left.
    pub fn tile_infos(&self, extent: &Extent, resolution: f64) -> Vec<TileInfo> {
        let level = self.nearest_level(resolution);
        let Some(clipped) = extent.intersection(&self.extent) else {
            return Vec::new();
        };

        let tiles = self.matrix_size(level);
        let span_x = self.extent.width() / tiles as f64;
        let span_y = self.extent.height() / tiles as f64;

        // nudge so an edge landing exactly on a tile border does not pull in a neighbour
        const EDGE: f64 = 1e-9;
        let to_range = |from: f64, to: f64, span: f64| {
            let first = ((from / span) + EDGE).floor().max(0.0) as u32;
            let last = ((to / span) - EDGE).ceil().max(0.0) as u32;
            (first.min(tiles), last.min(tiles))
        };

        let (min_col, max_col) = to_range(
            clipped.min_x - self.extent.min_x,
            clipped.max_x - self.extent.min_x,
            span_x,
        );
        let (min_row, max_row) = to_range(
            self.extent.max_y - clipped.max_y,
            self.extent.max_y - clipped.min_y,
            span_y,
        );

        let mut infos = Vec::with_capacity(((max_col - min_col) * (max_row - min_row)) as usize);
        for row in min_row..max_row {
            for col in min_col..max_col {
                let min_x = self.extent.min_x + col as f64 * span_x;
                let max_y = self.extent.max_y - row as f64 * span_y;
                infos.push(TileInfo {
                    index: TileIndex::new(level, col, row),
                    extent: Extent::new(min_x, max_y - span_y, min_x + span_x, max_y),
                });
            }
        }
        infos
    }
}
