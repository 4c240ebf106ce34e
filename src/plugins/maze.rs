//! Level loading: tuning, maze layout and its placement in the world.
//!
//! A maze that cannot be read is not fatal. The level falls back to the
//! empty grid, where the player moves freely and the pursuer idles.

use bevy::prelude::*;
use micromegas_tracing::prelude::{info, span_scope, warn};

use crate::app_state::AppState;
use crate::components::LevelEntity;
use crate::config::{Tuning, load_tuning};
use crate::maze::{Grid, Level};
use crate::resources::{LevelConfig, LevelState};

pub struct MazePlugin;

impl Plugin for MazePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(AppState::Loading),
            (load_tuning_file, load_level, finish_loading).chain(),
        );
        app.add_systems(OnExit(AppState::Playing), despawn_level);
    }
}

/// Replace `Tuning` with the level's tuning file, if it names one.
pub fn load_tuning_file(mut commands: Commands, config: Res<LevelConfig>) {
    let Some(path) = &config.tuning_file else {
        return;
    };
    let tuning = load_tuning(path).unwrap_or_else(|e| {
        warn!("{}; using default tuning", e);
        Tuning::default()
    });
    commands.insert_resource(tuning);
}

/// Read the maze and insert `LevelState`.
pub fn load_level(mut commands: Commands, config: Res<LevelConfig>, tuning: Res<Tuning>) {
    span_scope!("maze_load");
    let grid = config.maze.read().unwrap_or_else(|e| {
        warn!("{}; continuing without a maze", e);
        Grid::empty()
    });
    info!("maze loaded: {} rows x {} cols", grid.height(), grid.width());

    let level = Level::new(grid, config.cell_size, config.map_center).with_passable(
        tuning.player.passable_set(),
        tuning.pursuer.passable_set(),
    );
    commands.insert_resource(LevelState(level));
}

fn finish_loading(mut next_state: ResMut<NextState<AppState>>) {
    next_state.set(AppState::Playing);
}

/// Clear everything the level spawned, ready for the next load.
pub fn despawn_level(mut commands: Commands, query: Query<Entity, With<LevelEntity>>) {
    let mut count = 0;
    for entity in &query {
        commands.entity(entity).despawn();
        count += 1;
    }
    info!("level torn down: {} entities", count);
}
