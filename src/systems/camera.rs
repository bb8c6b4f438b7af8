use bevy::input::mouse::MouseWheel;
use bevy::prelude::*;

use crate::config::CameraSettings;

pub struct OrbitCamPlugin;

impl Plugin for OrbitCamPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (update, exit_on_escape));
    }
}

// camera component
#[derive(Component, Debug)]
pub struct OrbitCamera {
    pub radius: f32,
    pub speed: f32,
    pub angle: f32,
    pub v_angle: f32,
    pub is_dragging: bool,
    pub target: Vec3,

    pub min_radius: f32,
    pub max_radius: f32,

    pub keyboard_speed: f32,
    pub keyboard_zoom_speed: f32,
    pub scroll_zoom_speed: f32,
    pub sigmoid_factor: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default())
    }
}

impl OrbitCamera {
    pub fn from_settings(settings: &CameraSettings) -> Self {
        Self {
            radius: settings.distance,
            speed: settings.mouse_rotation_speed,
            angle: std::f32::consts::FRAC_PI_2,
            v_angle: 0.3,
            is_dragging: false,
            target: Vec3::ZERO,

            min_radius: settings.min_distance,
            max_radius: settings.max_distance,

            keyboard_speed: settings.keyboard_rotation_speed,
            keyboard_zoom_speed: settings.keyboard_zoom_speed,
            scroll_zoom_speed: settings.scroll_zoom_speed,
            sigmoid_factor: settings.zoom_sigmoid_factor,
        }
    }

    // set target point that for the camera to orbit
    pub fn with_target(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    // calculate world position from spherical coordinates
    // https://en.wikipedia.org/wiki/Spherical_coordinate_system#Cartesian_coordinates
    pub fn calculate_position(&self) -> Vec3 {
        let x = self.radius * self.v_angle.cos() * self.angle.cos();
        let y = self.radius * self.v_angle.sin();
        let z = self.radius * self.v_angle.cos() * self.angle.sin();

        self.target + Vec3::new(x, y, z)
    }

    /// Rotation multiplier between 0.5 and 1.5, smaller when zoomed in close.
    pub fn rotation_scale(&self) -> f32 {
        let zoom = (self.radius - self.min_radius) / self.sigmoid_factor.max(f32::EPSILON);
        2.0 / (1.0 + (-zoom).exp()) - 0.5
    }

    pub fn rotate(&mut self, delta_angle: f32, delta_v_angle: f32) {
        let scale = self.rotation_scale();
        self.angle += delta_angle * scale;
        // clamp pitch
        self.v_angle = (self.v_angle + delta_v_angle * scale).clamp(-1.5, 1.5);
    }

    /// Scale the orbit radius, positive steps move closer.
    pub fn zoom(&mut self, step: f32) {
        self.radius = (self.radius * (1.0 - step)).clamp(self.min_radius, self.max_radius);
    }
}

fn update(
    mut camera_query: Query<(&mut Transform, &mut OrbitCamera)>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    mut mouse_motion: EventReader<CursorMoved>,
    mut scroll_events: EventReader<MouseWheel>,
) {
    let motion: Vec2 = mouse_motion.read().filter_map(|m| m.delta).sum();
    let scroll: f32 = scroll_events.read().map(|s| s.y).sum();

    for (mut transform, mut camera) in camera_query.iter_mut() {
        // handle mouse drag
        if mouse_buttons.just_pressed(MouseButton::Right) {
            camera.is_dragging = true;
        }
        if mouse_buttons.just_released(MouseButton::Right) {
            camera.is_dragging = false;
        }

        if camera.is_dragging {
            let speed = camera.speed;
            camera.rotate(motion.x * speed, motion.y * speed);
        }

        // keyboard orbit
        let mut key_delta = Vec2::ZERO;
        if keys.pressed(KeyCode::KeyA) {
            key_delta.x += 1.0;
        }
        if keys.pressed(KeyCode::KeyD) {
            key_delta.x -= 1.0;
        }
        if keys.pressed(KeyCode::KeyW) {
            key_delta.y += 1.0;
        }
        if keys.pressed(KeyCode::KeyS) {
            key_delta.y -= 1.0;
        }
        if key_delta != Vec2::ZERO {
            let speed = camera.keyboard_speed;
            camera.rotate(key_delta.x * speed, key_delta.y * speed);
        }

        // zoom
        let mut zoom = scroll * camera.scroll_zoom_speed;
        if keys.pressed(KeyCode::ArrowUp) {
            zoom += camera.keyboard_zoom_speed;
        }
        if keys.pressed(KeyCode::ArrowDown) {
            zoom -= camera.keyboard_zoom_speed;
        }
        if zoom != 0.0 {
            camera.zoom(zoom);
        }

        // update camera position/orientation
        transform.translation = camera.calculate_position();
        transform.look_at(camera.target, Vec3::Y);
    }
}

// Escape closes the app, which also runs the teardown systems
fn exit_on_escape(keys: Res<ButtonInput<KeyCode>>, mut exit: EventWriter<AppExit>) {
    if keys.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }
}
