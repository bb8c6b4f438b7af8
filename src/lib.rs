pub mod config;
pub mod error;
pub mod render;
pub mod systems;
pub mod tiles;

pub use config::GlobeConfig;
pub use error::GlobeError;
