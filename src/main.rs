//! Headless chase demo: loads a maze, lets a scripted player run from the
//! pursuer and exits when the player is caught, escapes or time runs out.
//!
//! Usage: `dreadmaze [maze_file] [max_seconds]`

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::tasks::{ComputeTaskPool, TaskPoolBuilder};
use dreadmaze::app_state::AppState;
use dreadmaze::components::{Player, PlayerIntent, Pursuer};
use dreadmaze::events::{EscapeReached, PlayerCaught};
use dreadmaze::maze::planar;
use dreadmaze::plugins::GameSet;
use dreadmaze::resources::{MazeSource, level_config};
use dreadmaze::tracing_bridge::MicromegasBridgeLayer;
use micromegas_telemetry_sink::TelemetryGuardBuilder;
use micromegas_telemetry_sink::tracing_interop::TracingCaptureLayer;
use micromegas_tracing::dispatch::init_thread_stream;
use micromegas_tracing::levels::LevelFilter;
use micromegas_tracing::prelude::{info, warn};
use tracing_subscriber::Registry;
use tracing_subscriber::layer::SubscriberExt;

const DEFAULT_MAX_SECONDS: f32 = 60.0;

#[derive(Resource)]
struct DemoDeadline(Timer);

fn main() {
    // Spans require MICROMEGAS_ENABLE_CPU_TRACING=true; logs and metrics
    // always flow.
    let _telemetry_guard = TelemetryGuardBuilder::default()
        .with_install_tracing_capture(false)
        .build()
        .expect("failed to initialize telemetry");

    let mut args = std::env::args().skip(1);
    let mut config = level_config(1);
    if let Some(path) = args.next() {
        config.maze = MazeSource::File(path);
    }
    let max_seconds = match args.next().map(|s| s.parse::<f32>()) {
        Some(Ok(secs)) => secs,
        Some(Err(e)) => {
            warn!("ignoring invalid time limit: {}", e);
            DEFAULT_MAX_SECONDS
        }
        None => DEFAULT_MAX_SECONDS,
    };
    info!("dreadmaze demo starting: {:?}, {}s limit", config.maze, max_seconds);

    // Must be installed before Bevy starts emitting schedule spans.
    let log_layer = TracingCaptureLayer {
        max_level: LevelFilter::Info,
    };
    let subscriber = Registry::default()
        .with(MicromegasBridgeLayer::default())
        .with(log_layer);
    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");

    // Pool threads need their own Micromegas streams. Must exist before
    // App::new() so TaskPoolPlugin reuses it.
    ComputeTaskPool::get_or_init(|| {
        TaskPoolBuilder::new()
            .on_thread_spawn(|| {
                init_thread_stream();
            })
            .on_thread_destroy(|| {
                micromegas_tracing::dispatch::flush_thread_buffer();
                micromegas_tracing::dispatch::unregister_thread_stream();
            })
            .build()
    });

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(
            Duration::from_secs_f64(1.0 / 60.0),
        )))
        .add_plugins(StatesPlugin)
        .insert_resource(config)
        .insert_resource(DemoDeadline(Timer::from_seconds(max_seconds, TimerMode::Once)))
        .add_plugins(dreadmaze::DreadMazePlugin)
        .add_systems(Update, scripted_player.before(GameSet::Player))
        .add_systems(Update, enforce_deadline.run_if(in_state(AppState::Playing)))
        .add_observer(exit_on_catch)
        .add_observer(exit_on_escape)
        .run();
}

/// Run away from the pursuer; turn a quarter when blocked.
fn scripted_player(
    pursuers: Query<&Transform, (With<Pursuer>, Without<Player>)>,
    mut players: Query<(&Transform, &mut PlayerIntent), With<Player>>,
    mut last: Local<Option<Vec2>>,
) {
    let Ok((transform, mut intent)) = players.single_mut() else {
        return;
    };
    let here = planar(transform.translation);
    let stuck = last.is_some_and(|p| p.distance(here) < 1e-3);
    *last = Some(here);

    if !stuck {
        let away = pursuers
            .single()
            .ok()
            .and_then(|p| (here - planar(p.translation)).try_normalize());
        if let Some(away) = away {
            intent.0 = away;
            return;
        }
    }
    if stuck || intent.0 == Vec2::ZERO {
        intent.0 = if intent.0 == Vec2::ZERO { Vec2::X } else { intent.0.perp() };
    }
}

fn enforce_deadline(
    time: Res<Time>,
    mut deadline: ResMut<DemoDeadline>,
    mut exit: MessageWriter<AppExit>,
) {
    if deadline.0.tick(time.delta()).just_finished() {
        info!("player survived until the time limit");
        exit.write(AppExit::Success);
    }
}

fn exit_on_catch(trigger: On<PlayerCaught>, mut exit: MessageWriter<AppExit>) {
    let caught = trigger.event();
    info!(
        "caught by the pursuer ({:?}, {:.2} away); ending the demo",
        caught.mode, caught.distance
    );
    exit.write(AppExit::Success);
}

fn exit_on_escape(trigger: On<EscapeReached>, mut exit: MessageWriter<AppExit>) {
    let p = trigger.event().position;
    info!("player escaped at ({:.1}, {:.1})", p.x, p.y);
    exit.write(AppExit::Success);
}
