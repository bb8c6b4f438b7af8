use bevy::prelude::*;

use crate::config::GlobeConfig;
use crate::render::IndexedMesh;
use crate::systems::globe::texture::AtlasTexture;
use crate::systems::globe::{GlobeWireframe, setup_globe};

pub struct DebugPlugin;

impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_debug_map.after(setup_globe))
            .add_systems(Update, (toggle_debug_map, toggle_wireframe))
            .add_systems(Last, release_debug_map.run_if(on_event::<AppExit>));
    }
}

// flat quad showing the raw atlas next to the globe
#[derive(Component)]
pub struct DebugMap;

#[derive(Resource)]
pub struct DebugMapAssets {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
    pub entity: Entity,
}

fn spawn_debug_map(
    mut commands: Commands,
    config: Res<GlobeConfig>,
    texture: Option<Res<AtlasTexture>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(texture) = texture else {
        warn!("no atlas texture, debug map disabled");
        return;
    };

    let radius = config.earth.radius;
    let mesh = meshes.add(IndexedMesh::quad(2.0 * radius, 2.0 * radius).to_bevy_mesh());
    let material = materials.add(StandardMaterial {
        base_color_texture: Some(texture.handle().clone()),
        unlit: true,
        ..default()
    });

    let visibility = if config.debug.show_map {
        Visibility::Visible
    } else {
        Visibility::Hidden
    };

    let entity = commands
        .spawn((
            DebugMap,
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material.clone()),
            Transform::from_xyz(-3.0 * radius, 0.0, 0.0),
            visibility,
        ))
        .id();

    commands.insert_resource(DebugMapAssets {
        mesh,
        material,
        entity,
    });
}

// M shows/hides the flat map
fn toggle_debug_map(
    keys: Res<ButtonInput<KeyCode>>,
    mut maps: Query<&mut Visibility, With<DebugMap>>,
) {
    if !keys.just_pressed(KeyCode::KeyM) {
        return;
    }
    for mut visibility in &mut maps {
        toggle(&mut visibility);
    }
}

// F shows/hides the grid lines
fn toggle_wireframe(
    keys: Res<ButtonInput<KeyCode>>,
    mut wireframes: Query<&mut Visibility, With<GlobeWireframe>>,
) {
    if !keys.just_pressed(KeyCode::KeyF) {
        return;
    }
    for mut visibility in &mut wireframes {
        toggle(&mut visibility);
    }
}

fn toggle(visibility: &mut Visibility) {
    *visibility = match *visibility {
        Visibility::Hidden => Visibility::Visible,
        _ => Visibility::Hidden,
    };
}

fn release_debug_map(world: &mut World) {
    let Some(assets) = world.remove_resource::<DebugMapAssets>() else {
        return;
    };
    world.resource_mut::<Assets<Mesh>>().remove(&assets.mesh);
    world
        .resource_mut::<Assets<StandardMaterial>>()
        .remove(&assets.material);
    world.despawn(assets.entity);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_map_is_released_on_exit() {
        let mut app = App::new();
        app.add_event::<AppExit>()
            .insert_resource(Assets::<Mesh>::default())
            .insert_resource(Assets::<StandardMaterial>::default())
            .add_systems(Last, release_debug_map.run_if(on_event::<AppExit>));

        let world = app.world_mut();
        let mesh = world
            .resource_mut::<Assets<Mesh>>()
            .add(IndexedMesh::quad(2.0, 2.0).to_bevy_mesh());
        let material = world
            .resource_mut::<Assets<StandardMaterial>>()
            .add(StandardMaterial::default());
        let entity = world.spawn(DebugMap).id();
        world.insert_resource(DebugMapAssets {
            mesh: mesh.clone(),
            material: material.clone(),
            entity,
        });

        app.update();
        assert!(app.world().contains_resource::<DebugMapAssets>());

        app.world_mut().send_event(AppExit::Success);
        app.update();

        let world = app.world();
        assert!(!world.contains_resource::<DebugMapAssets>());
        assert!(world.resource::<Assets<Mesh>>().get(&mesh).is_none());
        assert!(
            world
                .resource::<Assets<StandardMaterial>>()
                .get(&material)
                .is_none()
        );
        assert!(world.get_entity(entity).is_err());
    }

    #[test]
    fn toggle_flips_between_hidden_and_visible() {
        let mut visibility = Visibility::Hidden;
        toggle(&mut visibility);
        assert_eq!(visibility, Visibility::Visible);
        toggle(&mut visibility);
        assert_eq!(visibility, Visibility::Hidden);

        // inherited counts as shown
        let mut visibility = Visibility::Inherited;
        toggle(&mut visibility);
        assert_eq!(visibility, Visibility::Hidden);
    }
}
