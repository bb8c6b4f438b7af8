use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::USER_AGENT;

use crate::config::{MapSettings, TileSourceConfig};
use crate::error::GlobeError;
use crate::tiles::schema::{TileIndex, TileInfo, TileSchema};

/// Something that can list tiles and hand out their encoded bytes.
pub trait TileSource {
    fn schema(&self) -> &TileSchema;

    /// Compressed image bytes (png, jpeg, ...) for one tile. Blocks.
    fn fetch_tile(&self, info: &TileInfo) -> Result<Vec<u8>, GlobeError>;

    /// Short human readable name for logs.
    fn describe(&self) -> String;
}

/// Fill a `{z}/{x}/{y}` style template.
pub fn expand_template(template: &str, index: &TileIndex) -> String {
    template
        .replace("{z}", &index.level.to_string())
        .replace("{x}", &index.col.to_string())
        .replace("{y}", &index.row.to_string())
}

/// Tiles from an XYZ web tile server.
///
/// Requests go out one at a time through an owned single threaded runtime,
/// so `fetch_tile` is an ordinary blocking call.
pub struct HttpTileSource {
    schema: TileSchema,
    url_template: String,
    user_agent: String,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl HttpTileSource {
    pub fn new(
        schema: TileSchema,
        url_template: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GlobeError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GlobeError::Config(format!("failed to build http client: {err}")))?;

        Ok(Self {
            schema,
            url_template: url_template.into(),
            user_agent: user_agent.into(),
            client,
            runtime,
        })
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }
}

impl TileSource for HttpTileSource {
    fn schema(&self) -> &TileSchema {
        &self.schema
    }

    fn fetch_tile(&self, info: &TileInfo) -> Result<Vec<u8>, GlobeError> {
        let url = expand_template(&self.url_template, &info.index);
        tracing::debug!(tile = %info.index, %url, "fetching tile");

        self.runtime
            .block_on(self.get(&url))
            .map_err(|err| GlobeError::TileFetch {
                tile: info.index,
                reason: err.to_string(),
            })
    }

    fn describe(&self) -> String {
        self.url_template.clone()
    }
}

/// Tiles stored on disk as `root/{z}/{x}/{y}.{extension}`.
pub struct DirectoryTileSource {
    schema: TileSchema,
    root: PathBuf,
    extension: String,
}

impl DirectoryTileSource {
    pub fn new(schema: TileSchema, root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            schema,
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn tile_path(&self, index: &TileIndex) -> PathBuf {
        self.root
            .join(index.level.to_string())
            .join(index.col.to_string())
            .join(format!("{}.{}", index.row, self.extension))
    }
}

impl TileSource for DirectoryTileSource {
    fn schema(&self) -> &TileSchema {
        &self.schema
    }

    fn fetch_tile(&self, info: &TileInfo) -> Result<Vec<u8>, GlobeError> {
        let path = self.tile_path(&info.index);
        std::fs::read(&path).map_err(|err| GlobeError::TileFetch {
            tile: info.index,
            reason: format!("{}: {err}", path.display()),
        })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Build the tile source described by the map settings.
pub fn open_tile_source(
    settings: &MapSettings,
) -> Result<Box<dyn TileSource + Send + Sync>, GlobeError> {
    let schema = TileSchema::new(settings.extent, settings.tile_size, settings.max_level)?;

    let source: Box<dyn TileSource + Send + Sync> = match &settings.source {
        TileSourceConfig::Http {
            url_template,
            user_agent,
            timeout_secs,
        } => Box::new(HttpTileSource::new(
            schema,
            url_template.clone(),
            user_agent.clone(),
            Duration::from_secs(*timeout_secs),
        )?),
        TileSourceConfig::Directory { root, extension } => {
            Box::new(DirectoryTileSource::new(schema, root.clone(), extension.clone()))
        }
    };

    tracing::info!(source = %source.describe(), "opened tile source");
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::schema::WEB_MERCATOR_EXTENT;

    fn info(level: u8, col: u32, row: u32) -> TileInfo {
        TileInfo {
            index: TileIndex::new(level, col, row),
            extent: WEB_MERCATOR_EXTENT,
        }
    }

    #[test]
    fn template_expansion() {
        let url = expand_template(
            "https://tile.example.org/{z}/{x}/{y}.png",
            &TileIndex::new(4, 9, 3),
        );
        assert_eq!(url, "https://tile.example.org/4/9/3.png");
    }

    #[test]
    fn directory_source_reads_xyz_layout() {
        let dir = tempfile::tempdir().unwrap();
        let tile_dir = dir.path().join("1").join("0");
        std::fs::create_dir_all(&tile_dir).unwrap();
        std::fs::write(tile_dir.join("1.png"), b"tile bytes").unwrap();

        let source = DirectoryTileSource::new(
            TileSchema::global_mercator(256, 4).unwrap(),
            dir.path(),
            "png",
        );

        assert_eq!(source.fetch_tile(&info(1, 0, 1)).unwrap(), b"tile bytes");

        let err = source.fetch_tile(&info(1, 1, 1)).unwrap_err();
        assert!(matches!(
            err,
            GlobeError::TileFetch { tile, .. } if tile == TileIndex::new(1, 1, 1)
        ));
    }

    #[test]
    fn opens_directory_source_from_settings() {
        let settings = MapSettings {
            source: TileSourceConfig::Directory {
                root: PathBuf::from("tiles"),
                extension: "jpg".to_string(),
            },
            ..MapSettings::default()
        };
        let source = open_tile_source(&settings).unwrap();
        assert_eq!(source.describe(), "tiles");
        assert_eq!(source.schema().tile_size(), 256);
    }

    #[test]
    fn opens_http_source_without_touching_network() {
        let source = open_tile_source(&MapSettings::default()).unwrap();
        assert!(source.describe().contains("{z}"));
    }
}
