pub mod ai;
pub mod app_state;
pub mod avatar;
pub mod components;
pub mod config;
pub mod events;
pub mod maze;
pub mod plugins;
pub mod resources;
pub mod tracing_bridge;

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use app_state::AppState;
use config::Tuning;
use plugins::GameSet;
use plugins::collectibles::CollectiblePlugin;
use plugins::maze::MazePlugin;
use plugins::player::PlayerPlugin;
use plugins::pursuer::PursuerPlugin;
use plugins::telemetry::TelemetryPlugin;
use resources::{CatchLog, level_config};

pub struct DreadMazePlugin;

impl Plugin for DreadMazePlugin {
    fn build(&self, app: &mut App) {
        // StatesPlugin comes from DefaultPlugins, or is added by the caller
        // on top of MinimalPlugins.
        app.init_state::<AppState>();

        // Callers may insert their own before adding the plugin
        if !app.world().contains_resource::<resources::LevelConfig>() {
            app.insert_resource(level_config(1));
        }
        app.init_resource::<Tuning>();

        app.configure_sets(
            Update,
            (
                GameSet::Player,
                GameSet::Interact,
                GameSet::Pursuer,
                GameSet::Catch,
            )
                .chain()
                .run_if(in_state(AppState::Playing)),
        );

        app.add_plugins(MazePlugin);
        app.add_plugins(PlayerPlugin);
        app.add_plugins(CollectiblePlugin);
        app.add_plugins(PursuerPlugin);
        app.add_plugins(TelemetryPlugin);

        app.add_systems(OnEnter(AppState::Playing), init_level_session);
    }
}

/// Fresh per-level bookkeeping each time play starts.
#[span_fn]
fn init_level_session(mut commands: Commands) {
    commands.insert_resource(CatchLog::default());
}
