use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::texture::AtlasTexture;
use super::{Globe, GlobeStatus};
use crate::config::GlobeConfig;
use crate::render::sphere::{ray_sphere_intersection, surface_to_uv};
use crate::tiles::Extent;
use crate::tiles::schema::web_mercator_to_lat_lon;

/// A clicked spot on the globe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickedLocation {
    pub uv: Vec2,
    pub latitude: f64,
    pub longitude: f64,
}

impl PickedLocation {
    /// The atlas stretches the map extent over the whole texture, so a
    /// texture coordinate maps linearly back to projected metres.
    pub fn from_uv(uv: Vec2, extent: &Extent) -> Self {
        let (x, y) = extent.point_at(uv.x as f64, uv.y as f64);
        let (latitude, longitude) = web_mercator_to_lat_lon(x, y);
        Self {
            uv,
            latitude,
            longitude,
        }
    }
}

/// Square of `size` pixels centered on `uv`, clipped to the atlas.
/// Returns (x, y, width, height).
pub fn highlight_rect(
    uv: Vec2,
    size: u32,
    atlas_width: u32,
    atlas_height: u32,
) -> (u32, u32, u32, u32) {
    let size = size.max(1);
    let clip = |coord: f32, extent: u32| {
        let center = ((coord.clamp(0.0, 1.0) * extent as f32) as u32).min(extent - 1);
        let start = center.saturating_sub(size / 2);
        let len = size.min(extent - start);
        (start, len)
    };

    let (x, width) = clip(uv.x, atlas_width);
    let (y, height) = clip(uv.y, atlas_height);
    (x, y, width, height)
}

// paint a marker into the atlas where the globe was left clicked
pub fn highlight_clicked_region(
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform)>,
    globes: Query<&GlobalTransform, With<Globe>>,
    config: Res<GlobeConfig>,
    mut texture: ResMut<AtlasTexture>,
    mut images: ResMut<Assets<Image>>,
    mut status: ResMut<GlobeStatus>,
) {
    if !mouse_buttons.just_pressed(MouseButton::Left) {
        return;
    }

    let (Ok(window), Ok((camera, camera_transform)), Ok(globe_transform)) =
        (windows.single(), cameras.single(), globes.single())
    else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(camera_transform, cursor) else {
        return;
    };

    // intersect in the sphere's own frame
    let to_local = globe_transform.affine().inverse();
    let origin = to_local.transform_point3(ray.origin);
    let direction = to_local.transform_vector3(*ray.direction);

    let radius = config.earth.radius;
    let Some(hit) = ray_sphere_intersection(origin, direction, radius) else {
        return;
    };

    let uv = surface_to_uv(hit, radius);
    let (width, height) = (texture.atlas().width(), texture.atlas().height());
    let (x, y, w, h) = highlight_rect(uv, config.debug.highlight_size, width, height);

    let color = config.debug.highlight_color;
    if let Err(err) = texture.fill_solid_color(&mut images, x, y, w, h, color) {
        warn!("failed to highlight clicked region: {err}");
        return;
    }

    let location = PickedLocation::from_uv(uv, &config.map.extent);
    info!(
        "picked {:.4}, {:.4} (atlas {}, {})",
        location.latitude, location.longitude, x, y
    );
    status.picked = Some(location);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::WEB_MERCATOR_EXTENT;

    #[test]
    fn rect_is_centered() {
        assert_eq!(highlight_rect(Vec2::new(0.5, 0.5), 8, 64, 64), (28, 28, 8, 8));
    }

    #[test]
    fn rect_is_clipped_at_edges() {
        assert_eq!(highlight_rect(Vec2::new(0.0, 0.0), 8, 64, 64), (0, 0, 8, 8));
        assert_eq!(highlight_rect(Vec2::new(1.0, 1.0), 8, 64, 64), (59, 59, 5, 5));
        // out of range coordinates are clamped first
        assert_eq!(highlight_rect(Vec2::new(-3.0, 7.0), 4, 16, 16), (0, 13, 4, 3));
    }

    #[test]
    fn zero_size_still_marks_a_pixel() {
        assert_eq!(highlight_rect(Vec2::new(0.25, 0.75), 0, 8, 8), (2, 6, 1, 1));
    }

    #[test]
    fn center_of_map_is_null_island() {
        let location = PickedLocation::from_uv(Vec2::new(0.5, 0.5), &WEB_MERCATOR_EXTENT);
        assert!(location.latitude.abs() < 1e-6);
        assert!(location.longitude.abs() < 1e-6);

        let corner = PickedLocation::from_uv(Vec2::ZERO, &WEB_MERCATOR_EXTENT);
        assert!((corner.longitude + 180.0).abs() < 1e-6);
        assert!(corner.latitude > 85.0);
    }
}
