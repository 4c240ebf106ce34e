//! Maze model shared by the player, the pursuer and placement code.

pub mod collision;
pub mod grid;
pub mod transform;

use bevy::math::Vec2;
use thiserror::Error;

pub use collision::WallCollider;
pub use grid::{Grid, GridCell, PassableSet, Tile};
pub use transform::{GridTransform, planar};

#[derive(Debug, Error)]
pub enum MazeError {
    #[error("maze layout is empty")]
    Empty,
    #[error("failed to read maze file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything spatial about one loaded level: the layout, where it sits in
/// the world, and which tiles each mover may enter.
#[derive(Debug, Clone)]
pub struct Level {
    pub grid: Grid,
    pub transform: GridTransform,
    pub player_passable: PassableSet,
    pub pursuer_passable: PassableSet,
}

impl Level {
    /// Centre `grid` on `center` with the default passable sets.
    pub fn new(grid: Grid, cell_size: f32, center: Vec2) -> Self {
        let transform = GridTransform::centered(&grid, cell_size, center);
        Self {
            grid,
            transform,
            player_passable: PassableSet::player_default(),
            pursuer_passable: PassableSet::pursuer_default(),
        }
    }

    /// A level with no maze. Every spatial query against it is a no-op.
    pub fn empty(cell_size: f32) -> Self {
        Self::new(Grid::empty(), cell_size, Vec2::ZERO)
    }

    pub fn with_passable(mut self, player: PassableSet, pursuer: PassableSet) -> Self {
        self.player_passable = player;
        self.pursuer_passable = pursuer;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    pub fn player_collider(&self) -> WallCollider<'_> {
        WallCollider::new(&self.grid, &self.transform, &self.player_passable)
    }
}
