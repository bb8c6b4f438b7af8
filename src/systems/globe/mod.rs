use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

pub mod picking;
pub mod texture;

use picking::{PickedLocation, highlight_clicked_region};
use texture::AtlasTexture;

use crate::config::GlobeConfig;
use crate::render::atlas::TextureAtlas;
use crate::render::sphere::generate_sphere;
use crate::tiles::{LoadReport, load_tiles, open_tile_source};

pub struct GlobePlugin;

impl Plugin for GlobePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GlobeStatus>()
            .add_systems(Startup, setup_globe)
            .add_systems(
                Update,
                highlight_clicked_region.run_if(resource_exists::<AtlasTexture>),
            )
            .add_systems(Last, release_globe.run_if(on_event::<AppExit>));
    }
}

// globe tag
#[derive(Component)]
pub struct Globe;

// wireframe overlay tag, child of the globe
#[derive(Component)]
pub struct GlobeWireframe;

/// Strong handles to everything the globe uploaded.
/// Owned here and released once on exit.
#[derive(Resource)]
pub struct GlobeAssets {
    pub mesh: Handle<Mesh>,
    pub wireframe: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
    pub wireframe_material: Handle<StandardMaterial>,
    pub entity: Entity,
}

/// What the UI shows about the globe.
#[derive(Resource, Default, Debug)]
pub struct GlobeStatus {
    pub report: Option<LoadReport>,
    pub atlas_size: UVec2,
    pub picked: Option<PickedLocation>,
}

/// Build geometry, stitch the tile atlas and spawn the globe.
/// Any failure here stops the app, a half textured globe is never shown.
pub fn setup_globe(
    mut commands: Commands,
    config: Res<GlobeConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut status: ResMut<GlobeStatus>,
) -> Result {
    let earth = &config.earth;
    let sphere = generate_sphere(earth.sector_count, earth.stack_count, earth.radius)?;

    let mut atlas = TextureAtlas::new(earth.initial_resolution, earth.initial_resolution)?;
    let source = open_tile_source(&config.map)?;
    let report = load_tiles(&mut atlas, source.as_ref(), &config.map.extent)?;

    status.report = Some(report);
    status.atlas_size = UVec2::new(atlas.width(), atlas.height());

    let texture = AtlasTexture::new(atlas, &mut images);

    let material = materials.add(StandardMaterial {
        base_color_texture: Some(texture.handle().clone()),
        metallic: 0.0,
        perceptual_roughness: 0.9,
        ..default()
    });
    let wireframe_material = materials.add(StandardMaterial {
        base_color: Color::srgba(1.0, 1.0, 1.0, 0.4),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });
    let mesh = meshes.add(sphere.to_bevy_mesh());
    let wireframe = meshes.add(sphere.to_bevy_wireframe());

    // sphere poles are on Z, bevy is Y up
    let globe = commands
        .spawn((
            Globe,
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material.clone()),
            Transform::from_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
        ))
        .id();

    // slightly larger so the lines do not z-fight with the surface
    commands.spawn((
        GlobeWireframe,
        Mesh3d(wireframe.clone()),
        MeshMaterial3d(wireframe_material.clone()),
        Transform::from_scale(Vec3::splat(1.002)),
        Visibility::Hidden,
        ChildOf(globe),
    ));

    info!(
        "globe ready: {} vertices, {} tiles at level {}",
        sphere.vertex_count(),
        report.tile_count,
        report.level
    );

    commands.insert_resource(texture);
    commands.insert_resource(GlobeAssets {
        mesh,
        wireframe,
        material,
        wireframe_material,
        entity: globe,
    });

    Ok(())
}

// release gpu side resources when the app shuts down
fn release_globe(world: &mut World) {
    let Some(globe_assets) = world.remove_resource::<GlobeAssets>() else {
        return;
    };

    if let Some(texture) = world.remove_resource::<AtlasTexture>() {
        texture.release(&mut world.resource_mut::<Assets<Image>>());
    }

    let mut meshes = world.resource_mut::<Assets<Mesh>>();
    meshes.remove(&globe_assets.mesh);
    meshes.remove(&globe_assets.wireframe);

    let mut materials = world.resource_mut::<Assets<StandardMaterial>>();
    materials.remove(&globe_assets.material);
    materials.remove(&globe_assets.wireframe_material);

    world.despawn(globe_assets.entity);
    info!("released globe resources");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::IndexedMesh;

    fn teardown_app() -> App {
        let mut app = App::new();
        app.add_event::<AppExit>()
            .insert_resource(Assets::<Mesh>::default())
            .insert_resource(Assets::<Image>::default())
            .insert_resource(Assets::<StandardMaterial>::default())
            .add_systems(Last, release_globe.run_if(on_event::<AppExit>));
        app
    }

    #[test]
    fn globe_assets_are_released_on_exit() {
        let mut app = teardown_app();
        let world = app.world_mut();

        let texture = {
            let mut images = world.resource_mut::<Assets<Image>>();
            AtlasTexture::new(TextureAtlas::new(4, 4).unwrap(), &mut images)
        };
        let image = texture.handle().clone();
        let (mesh, wireframe) = {
            let mut meshes = world.resource_mut::<Assets<Mesh>>();
            let quad = IndexedMesh::quad(1.0, 1.0);
            (meshes.add(quad.to_bevy_mesh()), meshes.add(quad.to_bevy_wireframe()))
        };
        let (material, wireframe_material) = {
            let mut materials = world.resource_mut::<Assets<StandardMaterial>>();
            (
                materials.add(StandardMaterial::default()),
                materials.add(StandardMaterial::default()),
            )
        };
        let entity = world.spawn(Globe).id();

        world.insert_resource(texture);
        world.insert_resource(GlobeAssets {
            mesh: mesh.clone(),
            wireframe: wireframe.clone(),
            material: material.clone(),
            wireframe_material: wireframe_material.clone(),
            entity,
        });

        // nothing happens without an exit request
        app.update();
        assert!(app.world().contains_resource::<GlobeAssets>());
        assert!(app.world().resource::<Assets<Image>>().get(&image).is_some());

        app.world_mut().send_event(AppExit::Success);
        app.update();

        let world = app.world();
        assert!(!world.contains_resource::<GlobeAssets>());
        assert!(!world.contains_resource::<AtlasTexture>());
        assert!(world.resource::<Assets<Image>>().get(&image).is_none());
        let meshes = world.resource::<Assets<Mesh>>();
        assert!(meshes.get(&mesh).is_none());
        assert!(meshes.get(&wireframe).is_none());
        let materials = world.resource::<Assets<StandardMaterial>>();
        assert!(materials.get(&material).is_none());
        assert!(materials.get(&wireframe_material).is_none());
        assert!(world.get_entity(entity).is_err());

        // a second exit finds nothing left to release
        app.world_mut().send_event(AppExit::Success);
        app.update();
    }
}
