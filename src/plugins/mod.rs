//! Bevy adapter: owns per-level state and drives the pursuer each frame.

pub mod collectibles;
pub mod maze;
pub mod player;
pub mod pursuer;
pub mod telemetry;

use bevy::prelude::*;

/// Frame ordering inside `Update`: the player moves and picks things up,
/// the pursuer reacts to the new position, then catches are checked
/// against the pursuer's move.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameSet {
    Player,
    Interact,
    Pursuer,
    Catch,
}
