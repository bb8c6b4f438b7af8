use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

use crate::config::GlobeConfig;
use crate::render::{TextureAtlas, generate_sphere};

pub struct BackgroundPlugin;

impl Plugin for BackgroundPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_background)
            .add_systems(Last, release_background.run_if(on_event::<AppExit>));
    }
}

#[derive(Component)]
pub struct Background;

#[derive(Resource)]
pub struct BackgroundAssets {
    pub mesh: Handle<Mesh>,
    pub image: Handle<Image>,
    pub material: Handle<StandardMaterial>,
    pub entity: Entity,
}

// large textured sphere seen from the inside
fn setup_background(
    mut commands: Commands,
    config: Res<GlobeConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) -> Result {
    let Some(settings) = &config.background else {
        return Ok(());
    };

    let texture = TextureAtlas::from_image_file(&settings.texture_path)?;
    let sphere = generate_sphere(settings.sector_count, settings.stack_count, settings.radius)?;

    info!(
        "background {} ({}x{})",
        settings.texture_path.display(),
        texture.width(),
        texture.height()
    );

    let image = images.add(texture.to_image());
    let mesh = meshes.add(sphere.to_bevy_mesh());
    let material = materials.add(StandardMaterial {
        base_color_texture: Some(image.clone()),
        unlit: true,
        cull_mode: None,
        ..default()
    });

    let entity = commands
        .spawn((
            Background,
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material.clone()),
            Transform::from_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
        ))
        .id();

    commands.insert_resource(BackgroundAssets {
        mesh,
        image,
        material,
        entity,
    });

    Ok(())
}

fn release_background(world: &mut World) {
    let Some(assets) = world.remove_resource::<BackgroundAssets>() else {
        return;
    };
    world.resource_mut::<Assets<Mesh>>().remove(&assets.mesh);
    world.resource_mut::<Assets<Image>>().remove(&assets.image);
    world
        .resource_mut::<Assets<StandardMaterial>>()
        .remove(&assets.material);
    world.despawn(assets.entity);
}
