use bevy::prelude::*;

use crate::systems::globe::GlobeStatus;

pub struct GlobeUiPlugin;

impl Plugin for GlobeUiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_ui)
            .add_systems(Update, update_status.run_if(resource_changed::<GlobeStatus>));
    }
}

// map tiles line
#[derive(Component)]
pub struct TileCounter;

// atlas size line
#[derive(Component)]
pub struct AtlasDisplay;

// last clicked coordinate
#[derive(Component)]
pub struct PickDisplay;

fn line(text: &str) -> (Text, TextFont, TextColor) {
    (
        Text::new(text),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        TextColor(Color::WHITE),
    )
}

fn setup_ui(mut commands: Commands) {
    // create UI container
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::Start,
                justify_content: JustifyContent::Start,
                padding: UiRect::all(Val::Px(20.0)),
                ..default()
            },
            BackgroundColor(Color::NONE),
        ))
        .with_children(|parent| {
            parent.spawn((line("Tiles: Loading..."), TileCounter));

            parent.spawn((
                line("Atlas: -"),
                AtlasDisplay,
                Node {
                    margin: UiRect::top(Val::Px(5.0)),
                    ..default()
                },
            ));

            parent.spawn((
                line("Click the globe to mark a spot"),
                PickDisplay,
                Node {
                    margin: UiRect::top(Val::Px(5.0)),
                    ..default()
                },
            ));
        });
}

fn update_status(
    status: Res<GlobeStatus>,
    mut tiles: Query<&mut Text, (With<TileCounter>, Without<AtlasDisplay>, Without<PickDisplay>)>,
    mut atlas: Query<&mut Text, (With<AtlasDisplay>, Without<TileCounter>, Without<PickDisplay>)>,
    mut picked: Query<&mut Text, (With<PickDisplay>, Without<TileCounter>, Without<AtlasDisplay>)>,
) {
    if let (Ok(mut text), Some(report)) = (tiles.single_mut(), status.report) {
        text.0 = format!(
            "Tiles: {} at level {} ({}x{})",
            report.tile_count, report.level, report.columns, report.rows
        );
    }

    if let Ok(mut text) = atlas.single_mut() {
        text.0 = format!("Atlas: {}x{}", status.atlas_size.x, status.atlas_size.y);
    }

    if let (Ok(mut text), Some(location)) = (picked.single_mut(), status.picked) {
        text.0 = format!(
            "Picked: {:.4}, {:.4}",
            location.latitude, location.longitude
        );
    }
}
