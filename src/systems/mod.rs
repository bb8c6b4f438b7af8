pub mod background;
pub mod camera;
pub mod debug;
pub mod globe;
pub mod ui;
