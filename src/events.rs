//! Gameplay events triggered by the pursuer and collectible systems. The
//! game-over layer and telemetry observe them.

use bevy::prelude::*;

use crate::ai::PursuerMode;
use crate::components::KeyColor;
use crate::maze::GridCell;

/// The pursuer reached the player. Fired once per contact.
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerCaught {
    pub distance: f32,
    pub mode: PursuerMode,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct PursuerModeChanged {
    pub from: PursuerMode,
    pub to: PursuerMode,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct PursuerSpawned {
    pub position: Vec3,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct KeyCollected {
    pub color: KeyColor,
    /// Keys held after this one.
    pub total: usize,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct LockOpened {
    pub color: KeyColor,
    pub cell: GridCell,
}

/// The player stood on the open escape point. Fired once per level.
#[derive(Event, Debug, Clone, Copy)]
pub struct EscapeReached {
    pub position: Vec2,
}
