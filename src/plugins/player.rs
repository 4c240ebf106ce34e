//! Player spawning, keyboard input and wall-aware movement.

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::app_state::AppState;
use crate::components::*;
use crate::config::Tuning;
use crate::maze::{Level, planar};
use crate::plugins::GameSet;
use crate::resources::{LevelConfig, LevelState, PursuerTarget};

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::Playing), spawn_player);
        app.add_systems(
            Update,
            (
                player_keyboard_input.run_if(resource_exists::<ButtonInput<KeyCode>>),
                move_player,
            )
                .chain()
                .in_set(GameSet::Player),
        );
    }
}

/// Where the player starts: the map centre when it is clear of walls,
/// otherwise the nearest cell the player may stand on.
pub fn player_start(level: &Level, center: Vec2, padding: f32) -> Vec2 {
    if level.is_empty() || level.player_collider().is_position_passable(center, padding) {
        return center;
    }
    level
        .transform
        .world_to_grid(center)
        .and_then(|cell| {
            level
                .grid
                .nearest_walkable(cell, &level.player_passable, usize::MAX)
        })
        .map(|cell| level.transform.grid_to_world(cell))
        .unwrap_or(center)
}

/// Spawn the player and make it the pursuer's target.
#[span_fn]
pub fn spawn_player(
    mut commands: Commands,
    level: Res<LevelState>,
    tuning: Res<Tuning>,
    config: Res<LevelConfig>,
) {
    let start = player_start(&level, config.map_center, tuning.player.padding);
    let entity = commands
        .spawn((
            Player,
            PlayerIntent::default(),
            LevelEntity,
            Transform::from_xyz(start.x, 0.0, start.y),
        ))
        .id();
    commands.insert_resource(PursuerTarget(SceneRef::Visual(entity)));
    info!("player spawned at ({:.1}, {:.1})", start.x, start.y);
}

/// WASD / arrows on the map axes: up is +Z, right is +X.
fn player_keyboard_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut query: Query<&mut PlayerIntent, With<Player>>,
) {
    let pressed = |a, b| keyboard.pressed(a) || keyboard.pressed(b);
    let x = pressed(KeyCode::KeyD, KeyCode::ArrowRight) as i32
        - pressed(KeyCode::KeyA, KeyCode::ArrowLeft) as i32;
    let z = pressed(KeyCode::KeyW, KeyCode::ArrowUp) as i32
        - pressed(KeyCode::KeyS, KeyCode::ArrowDown) as i32;
    for mut intent in &mut query {
        intent.0 = Vec2::new(x as f32, z as f32);
    }
}

/// Move along the intent at player speed, sliding along walls.
#[span_fn]
pub fn move_player(
    time: Res<Time>,
    level: Res<LevelState>,
    tuning: Res<Tuning>,
    mut query: Query<(&PlayerIntent, &mut Transform), With<Player>>,
) {
    let dt = time.delta_secs();
    let collider = level.player_collider();
    let reach = tuning.player.radius + tuning.player.padding;
    for (intent, mut transform) in &mut query {
        let Some(dir) = intent.try_normalize() else {
            continue;
        };
        let from = planar(transform.translation);
        let to = from + dir * tuning.player.speed * dt;
        let next = collider.resolve(from, to, reach);
        transform.translation.x = next.x;
        transform.translation.z = next.y;
    }
}
