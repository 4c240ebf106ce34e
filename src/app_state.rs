use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, States)]
pub enum AppState {
    /// Reading tuning and the maze file.
    #[default]
    Loading,
    Playing,
}
