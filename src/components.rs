use bevy::ecs::query::QueryFilter;
use bevy::prelude::*;

use crate::ai::{PursuerAgent, TickReport};
use crate::avatar::JumpAnimator;
use crate::maze::GridCell;

// ---------------------------------------------------------------------------
// Entity markers
// ---------------------------------------------------------------------------

#[derive(Component, Debug)]
pub struct Player;

/// Everything spawned for the current level; despawned when play stops.
#[derive(Component, Debug)]
pub struct LevelEntity;

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Desired planar movement direction (x, z). Zero means stand still.
/// Written by input or a script, consumed by the movement system.
#[derive(Component, Debug, Default, Clone, Copy, Deref, DerefMut)]
pub struct PlayerIntent(pub Vec2);

// ---------------------------------------------------------------------------
// Pursuer
// ---------------------------------------------------------------------------

#[derive(Component, Debug, Deref, DerefMut)]
pub struct Pursuer(pub PursuerAgent);

/// The hopping body the pursuer AI steers.
#[derive(Component, Debug, Deref, DerefMut)]
pub struct PursuerBody(pub JumpAnimator);

/// Outcome of the pursuer's last tick and whether it was already touching
/// the player, for edge-triggered catch events.
#[derive(Component, Debug, Default)]
pub struct PursuerStatus {
    pub last: Option<TickReport>,
    pub in_contact: bool,
}

// ---------------------------------------------------------------------------
// Keys and locks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyColor {
    White,
    Green,
    Yellow,
}

impl KeyColor {
    pub const ALL: [KeyColor; 3] = [KeyColor::White, KeyColor::Green, KeyColor::Yellow];
}

/// A key lying in the maze, waiting to be picked up.
#[derive(Component, Debug, Clone, Copy)]
pub struct Key(pub KeyColor);

/// A closed lock. Opening it turns its cell into floor.
#[derive(Component, Debug, Clone, Copy)]
pub struct Lock {
    pub color: KeyColor,
    pub cell: GridCell,
}

// ---------------------------------------------------------------------------
// Scene references
// ---------------------------------------------------------------------------

/// Where to read a world position from: a live entity's transform, or a
/// fixed logical point when there is no visual node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneRef {
    Visual(Entity),
    LogicalOnly(Vec3),
}

impl SceneRef {
    /// `None` when the referenced entity is gone or has no transform.
    pub fn resolve<F: QueryFilter>(&self, transforms: &Query<&Transform, F>) -> Option<Vec3> {
        match self {
            SceneRef::Visual(entity) => transforms.get(*entity).ok().map(|t| t.translation),
            SceneRef::LogicalOnly(p) => Some(*p),
        }
    }
}
