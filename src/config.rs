use std::path::{Path, PathBuf};

use bevy::prelude::Resource;
use serde::Deserialize;

use crate::error::GlobeError;
use crate::tiles::{Extent, WEB_MERCATOR_EXTENT};

// Earth geometry (unit sphere, camera distances are relative to it)
pub const EARTH_RADIUS: f32 = 1.0;
pub const EARTH_SECTOR_COUNT: u32 = 70;
pub const EARTH_STACK_COUNT: u32 = 70;

// atlas is square, this is its edge in pixels
pub const INITIAL_RESOLUTION: u32 = 1024;

// Map tiles
pub const TILE_SIZE: u32 = 256;
pub const MAX_TILE_LEVEL: u8 = 19;
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_USER_AGENT: &str = "bevy-tileglobe";
pub const TILE_TIMEOUT_SECS: u64 = 30;

// Camera
pub const CAMERA_DISTANCE: f32 = 3.0;
pub const CAMERA_MIN_DISTANCE: f32 = 1.2;
pub const CAMERA_MAX_DISTANCE: f32 = 10.0;

// Asset paths
pub const CONFIG_PATH: &str = "assets/config/globe.json";
pub const CONFIG_ENV: &str = "GLOBE_CONFIG";

/// Runtime settings for the globe, passed explicitly to whoever needs them.
#[derive(Resource, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct GlobeConfig {
    pub earth: EarthSettings,
    pub map: MapSettings,
    pub camera: CameraSettings,
    pub background: Option<BackgroundSettings>,
    pub debug: DebugSettings,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EarthSettings {
    pub radius: f32,
    pub sector_count: u32,
    pub stack_count: u32,
    pub initial_resolution: u32,
}

impl Default for EarthSettings {
    fn default() -> Self {
        Self {
            radius: EARTH_RADIUS,
            sector_count: EARTH_SECTOR_COUNT,
            stack_count: EARTH_STACK_COUNT,
            initial_resolution: INITIAL_RESOLUTION,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MapSettings {
    pub extent: Extent,
    pub tile_size: u32,
    pub max_level: u8,
    pub source: TileSourceConfig,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            extent: WEB_MERCATOR_EXTENT,
            tile_size: TILE_SIZE,
            max_level: MAX_TILE_LEVEL,
            source: TileSourceConfig::default(),
        }
    }
}

/// Where map tiles come from.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TileSourceConfig {
    Http {
        url_template: String,
        #[serde(default = "default_user_agent")]
        user_agent: String,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    Directory {
        root: PathBuf,
        #[serde(default = "default_extension")]
        extension: String,
    },
}

impl Default for TileSourceConfig {
    fn default() -> Self {
        Self::Http {
            url_template: DEFAULT_TILE_URL.to_string(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_user_agent() -> String {
    TILE_USER_AGENT.to_string()
}

fn default_timeout() -> u64 {
    TILE_TIMEOUT_SECS
}

fn default_extension() -> String {
    "png".to_string()
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CameraSettings {
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub mouse_rotation_speed: f32,
    pub keyboard_rotation_speed: f32,
    pub keyboard_zoom_speed: f32,
    pub scroll_zoom_speed: f32,
    pub zoom_sigmoid_factor: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: CAMERA_DISTANCE,
            min_distance: CAMERA_MIN_DISTANCE,
            max_distance: CAMERA_MAX_DISTANCE,
            mouse_rotation_speed: 0.005,
            keyboard_rotation_speed: 0.01,
            keyboard_zoom_speed: 0.01,
            scroll_zoom_speed: 0.05,
            zoom_sigmoid_factor: 2.0,
        }
    }
}

/// Star sphere drawn behind the globe.
#[derive(Deserialize, Debug, Clone)]
pub struct BackgroundSettings {
    pub texture_path: PathBuf,
    #[serde(default = "default_background_radius")]
    pub radius: f32,
    #[serde(default = "default_background_segments")]
    pub sector_count: u32,
    #[serde(default = "default_background_segments")]
    pub stack_count: u32,
}

fn default_background_radius() -> f32 {
    50.0
}

fn default_background_segments() -> u32 {
    100
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DebugSettings {
    pub show_map: bool,
    pub highlight_color: [u8; 4],
    pub highlight_size: u32,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            show_map: false,
            highlight_color: [255, 0, 0, 255],
            highlight_size: 8,
        }
    }
}

impl GlobeConfig {
    /// Load from `$GLOBE_CONFIG`, then `assets/config/globe.json`, then defaults.
    pub fn load() -> Result<Self, GlobeError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }

        let path = Path::new(CONFIG_PATH);
        if path.exists() {
            return Self::from_file(path);
        }

        tracing::debug!("no config file found, using defaults");
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, GlobeError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json(&contents)
            .map_err(|err| GlobeError::Config(format!("{}: {err}", path.display())))?;
        tracing::info!(path = %path.display(), "loaded globe config");
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self, GlobeError> {
        let config: Self =
            serde_json::from_str(contents).map_err(|err| GlobeError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GlobeError> {
        let earth = &self.earth;
        if !(earth.radius.is_finite() && earth.radius > 0.0) {
            return Err(GlobeError::Config(format!(
                "earth.radius must be positive, got {}",
                earth.radius
            )));
        }
        if earth.sector_count < 3 || earth.stack_count < 2 {
            return Err(GlobeError::Config(format!(
                "earth needs at least 3 sectors and 2 stacks, got {}x{}",
                earth.sector_count, earth.stack_count
            )));
        }
        if earth.initial_resolution == 0 {
            return Err(GlobeError::Config("earth.initial_resolution must be > 0".into()));
        }

        let extent = &self.map.extent;
        if !(extent.width() > 0.0 && extent.height() > 0.0) {
            return Err(GlobeError::Config(format!("map.extent is empty: {extent:?}")));
        }
        if self.map.tile_size == 0 {
            return Err(GlobeError::Config("map.tile_size must be > 0".into()));
        }

        let camera = &self.camera;
        if camera.min_distance > camera.max_distance {
            return Err(GlobeError::Config(format!(
                "camera.min_distance {} exceeds max_distance {}",
                camera.min_distance, camera.max_distance
            )));
        }

        Ok(())
    }
}
