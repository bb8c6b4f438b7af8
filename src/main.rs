use bevy::prelude::*;

use bevy_tileglobe::GlobeConfig;
use bevy_tileglobe::systems::background::BackgroundPlugin;
use bevy_tileglobe::systems::camera::{OrbitCamPlugin, OrbitCamera};
use bevy_tileglobe::systems::debug::DebugPlugin;
use bevy_tileglobe::systems::globe::GlobePlugin;
use bevy_tileglobe::systems::ui::GlobeUiPlugin;

fn main() -> AppExit {
    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Tile Globe".into(),
            ..default()
        }),
        ..default()
    }));

    // LogPlugin is up now, so failures are reported through it
    let config = match GlobeConfig::load() {
        Ok(config) => config,
        Err(err) => {
            error!("invalid configuration: {err}");
            return AppExit::error();
        }
    };

    app.insert_resource(ClearColor(Color::srgb(0.1, 0.1, 0.1)))
        .insert_resource(config)
        .add_plugins((
            OrbitCamPlugin,
            GlobePlugin,
            DebugPlugin,
            BackgroundPlugin,
            GlobeUiPlugin,
        ))
        .add_systems(Startup, setup)
        .run()
}

// scene setup here
fn setup(mut commands: Commands, config: Res<GlobeConfig>) {
    // sun light
    commands.spawn((
        DirectionalLight {
            illuminance: 3_000.,
            ..default()
        },
        Transform::from_xyz(50.0, 20.0, 50.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.insert_resource(AmbientLight {
        brightness: 400.0,
        ..default()
    });

    // spawn camera
    let camera = OrbitCamera::from_settings(&config.camera).with_target(Vec3::ZERO);
    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(camera.calculate_position()).looking_at(Vec3::ZERO, Vec3::Y),
        camera,
    ));
}
