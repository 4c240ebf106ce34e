use bevy::prelude::*;

use crate::components::{KeyColor, SceneRef};
use crate::maze::{Grid, GridCell, Level, MazeError};

/// Default world units per maze cell.
pub const CELL_SIZE: f32 = 3.0;

// ---------------------------------------------------------------------------
// Level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum MazeSource {
    File(String),
    /// Layout text embedded directly, mostly for tests and demos.
    Inline(String),
}

impl MazeSource {
    pub fn read(&self) -> Result<Grid, MazeError> {
        match self {
            MazeSource::File(path) => Grid::load(path),
            MazeSource::Inline(text) => Grid::parse(text),
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct LevelConfig {
    pub maze: MazeSource,
    pub cell_size: f32,
    /// World (x, z) the maze is centred on.
    pub map_center: Vec2,
    /// Optional JSON tuning file. `None` keeps whatever `Tuning` is present.
    pub tuning_file: Option<String>,
    /// Seed for the pursuer's wander choices. `None` picks one at random.
    pub seed: Option<u64>,
    /// Where the keys lie. Spots the player cannot stand on are skipped.
    pub keys: Vec<KeySpot>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeySpot {
    pub cell: GridCell,
    pub color: KeyColor,
}

impl KeySpot {
    pub const fn new(row: i32, col: i32, color: KeyColor) -> Self {
        Self {
            cell: GridCell::new(row, col),
            color,
        }
    }
}

/// Build the level configuration for a given level number.
pub fn level_config(level: u32) -> LevelConfig {
    // Two layouts, alternating
    let (maze_file, keys) = match ((level.max(1) - 1) % 2) + 1 {
        1 => (
            "assets/maps/level_01.txt",
            vec![
                KeySpot::new(1, 1, KeyColor::White),
                KeySpot::new(1, 13, KeyColor::Green),
                KeySpot::new(13, 1, KeyColor::Yellow),
            ],
        ),
        _ => (
            "assets/maps/level_02.txt",
            vec![
                KeySpot::new(1, 1, KeyColor::White),
                KeySpot::new(1, 15, KeyColor::Green),
                KeySpot::new(13, 15, KeyColor::Yellow),
            ],
        ),
    };

    LevelConfig {
        maze: MazeSource::File(maze_file.to_string()),
        cell_size: CELL_SIZE,
        map_center: Vec2::ZERO,
        tuning_file: Some("assets/config/pursuer.json".to_string()),
        seed: None,
        keys,
    }
}

// ---------------------------------------------------------------------------
// Per-level state
// ---------------------------------------------------------------------------

/// The loaded maze and its placement. Empty when the maze failed to load.
#[derive(Resource, Debug, Clone, Deref, DerefMut)]
pub struct LevelState(pub Level);

/// What the pursuer is chasing.
#[derive(Resource, Debug, Clone, Copy, Deref)]
pub struct PursuerTarget(pub SceneRef);

/// Counts down from level start to the pursuer's arrival.
#[derive(Resource, Debug)]
pub struct PursuerSpawnTimer {
    pub timer: Timer,
}

/// Key colours picked up this level, in pickup order.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct CollectedKeys(pub Vec<KeyColor>);

impl CollectedKeys {
    pub fn has(&self, color: KeyColor) -> bool {
        self.0.contains(&color)
    }
}

/// The way out. It opens once every lock is gone.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct EscapeState {
    /// World (x, z) of the escape point. `None` when the maze has no locks.
    pub point: Option<Vec2>,
    pub locks_remaining: usize,
    pub open: bool,
    pub reached: bool,
}

#[derive(Resource, Debug, Default)]
pub struct CatchLog {
    pub catches: u32,
    pub last_distance: Option<f32>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
