//! Frame-level telemetry and pursuer metrics.

use bevy::prelude::*;
use micromegas_tracing::prelude::{fmetric, imetric, info, span_scope};

use crate::components::PursuerStatus;
use crate::events::{KeyCollected, LockOpened, PlayerCaught, PursuerModeChanged, PursuerSpawned};

pub struct TelemetryPlugin;

impl Plugin for TelemetryPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Last, (frame_telemetry, pursuer_telemetry));
        app.add_observer(log_mode_change);
        app.add_observer(log_spawn);
        app.add_observer(count_catch);
        app.add_observer(count_key);
        app.add_observer(count_lock);
    }
}

fn frame_telemetry(time: Res<Time>) {
    span_scope!("frame");
    let dt_ms = time.delta_secs_f64() * 1000.0;
    fmetric!("frame_time_ms", "ms", dt_ms);
}

fn pursuer_telemetry(query: Query<&PursuerStatus>) {
    for status in &query {
        let Some(report) = status.last else {
            continue;
        };
        fmetric!("pursuer_distance", "m", report.distance as f64);
        imetric!("pursuer_mode", "enum", report.mode as u64);
        if report.repathed {
            imetric!("pursuer_repath", "count", 1);
        }
    }
}

fn log_mode_change(trigger: On<PursuerModeChanged>) {
    let event = trigger.event();
    info!("pursuer {:?} -> {:?}", event.from, event.to);
}

fn log_spawn(trigger: On<PursuerSpawned>) {
    let p = trigger.event().position;
    info!("pursuer entered the maze at ({:.1}, {:.1})", p.x, p.z);
}

fn count_catch(_trigger: On<PlayerCaught>) {
    imetric!("player_caught", "count", 1);
}

fn count_key(trigger: On<KeyCollected>) {
    imetric!("keys_held", "count", trigger.event().total as u64);
}

fn count_lock(_trigger: On<LockOpened>) {
    imetric!("lock_opened", "count", 1);
}
