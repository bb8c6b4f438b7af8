pub mod loader;
pub mod schema;
pub mod source;

pub use loader::{LoadReport, load_tiles};
pub use schema::{Extent, TileIndex, TileInfo, TileSchema, WEB_MERCATOR_EXTENT};
pub use source::{DirectoryTileSource, HttpTileSource, TileSource, open_tile_source};
