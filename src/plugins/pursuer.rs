//! Pursuer lifecycle: delayed spawn, per-frame AI tick and catch events.

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::ai::PursuerAgent;
use crate::app_state::AppState;
use crate::avatar::{Avatar, JumpAnimator, JumpParams};
use crate::components::*;
use crate::config::Tuning;
use crate::events::{PlayerCaught, PursuerModeChanged, PursuerSpawned};
use crate::maze::planar;
use crate::plugins::GameSet;
use crate::resources::{CatchLog, LevelConfig, LevelState, PursuerSpawnTimer, PursuerTarget};

pub struct PursuerPlugin;

impl Plugin for PursuerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CatchLog>();
        app.add_systems(OnEnter(AppState::Playing), arm_spawn_timer);
        app.add_systems(
            Update,
            (spawn_pursuer_when_due, drive_pursuer)
                .chain()
                .in_set(GameSet::Pursuer),
        );
        app.add_systems(Update, detect_catch.in_set(GameSet::Catch));
    }
}

/// Start the countdown to the pursuer's arrival.
pub fn arm_spawn_timer(mut commands: Commands, tuning: Res<Tuning>) {
    commands.insert_resource(PursuerSpawnTimer {
        timer: Timer::from_seconds(tuning.pursuer.spawn_delay_secs.max(0.0), TimerMode::Once),
    });
}

fn spawn_pursuer_when_due(
    mut commands: Commands,
    time: Res<Time>,
    timer: Option<ResMut<PursuerSpawnTimer>>,
    level: Res<LevelState>,
    tuning: Res<Tuning>,
    config: Res<LevelConfig>,
    existing: Query<(), With<Pursuer>>,
) {
    let Some(mut timer) = timer else {
        return;
    };
    if !existing.is_empty() {
        return;
    }
    timer.timer.tick(time.delta());
    if !timer.timer.just_finished() {
        return;
    }

    let position = PursuerAgent::spawn_position(&level, &tuning.pursuer);
    let seed = config.seed.unwrap_or_else(rand::random);
    let agent =
        PursuerAgent::new(tuning.pursuer.clone(), seed).with_player_radius(tuning.player.radius);
    let body = JumpAnimator::new(
        position,
        1.0,
        JumpParams {
            jump_forward: level.transform.cell_size,
            ..default()
        },
    );

    commands.spawn((
        Pursuer(agent),
        PursuerBody(body),
        PursuerStatus::default(),
        LevelEntity,
        Transform::from_translation(position),
    ));
    commands.trigger(PursuerSpawned { position });
}

/// Tick the AI against the target's position, advance the body, then
/// record the catch result for the body's new position.
#[span_fn]
pub fn drive_pursuer(
    mut commands: Commands,
    time: Res<Time>,
    level: Res<LevelState>,
    target: Option<Res<PursuerTarget>>,
    transforms: Query<&Transform, Without<Pursuer>>,
    mut pursuers: Query<(
        &mut Pursuer,
        &mut PursuerBody,
        &mut PursuerStatus,
        &mut Transform,
    )>,
) {
    let Some(target) = target else {
        return;
    };
    let Some(player) = target.resolve(&transforms) else {
        debug!("pursuer target has no position this frame");
        return;
    };
    let dt = time.delta_secs();

    for (mut pursuer, mut body, mut status, mut transform) in &mut pursuers {
        let before = pursuer.mode();
        let mut report = pursuer.update(dt, player, &level, &mut body.0);
        body.advance(dt);
        // Catch is judged where the body ended up, not where it started
        report.caught = pursuer.sync_with_body(player, &body.0);
        report.distance = planar(body.position()).distance(planar(player));

        transform.translation = body.position();
        transform.rotation = Quat::from_rotation_y(pursuer.facing_yaw().to_radians());
        transform.scale = body.scale();

        if report.mode != before {
            commands.trigger(PursuerModeChanged {
                from: before,
                to: report.mode,
            });
        }
        status.last = Some(report);
    }
}

/// Fire `PlayerCaught` when a pursuer first touches the player.
pub fn detect_catch(
    mut commands: Commands,
    mut log: ResMut<CatchLog>,
    mut query: Query<&mut PursuerStatus>,
) {
    for mut status in &mut query {
        let Some(report) = status.last else {
            continue;
        };
        if report.caught && !status.in_contact {
            log.catches += 1;
            log.last_distance = Some(report.distance);
            info!(
                "player caught at distance {:.2} while {:?}",
                report.distance, report.mode
            );
            commands.trigger(PlayerCaught {
                distance: report.distance,
                mode: report.mode,
            });
        }
        status.in_contact = report.caught;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{PursuerMode, TickReport};

    #[derive(Resource, Default)]
    struct Caught(Vec<PlayerCaught>);

    fn report(caught: bool) -> TickReport {
        TickReport {
            mode: PursuerMode::Chase,
            caught,
            steering: None,
            repathed: false,
            in_sight: true,
            distance: 0.4,
        }
    }

    fn record_catch(trigger: On<PlayerCaught>, mut caught: ResMut<Caught>) {
        caught.0.push(*trigger.event());
    }

    fn setup_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.init_resource::<CatchLog>();
        app.init_resource::<Caught>();
        app.add_observer(record_catch);
        app.add_systems(Update, detect_catch);
        app
    }

    #[test]
    fn catch_fires_once_per_contact() {
        let mut app = setup_app();
        let pursuer = app
            .world_mut()
            .spawn(PursuerStatus {
                last: Some(report(true)),
                in_contact: false,
            })
            .id();

        for _ in 0..3 {
            app.update();
        }
        assert_eq!(app.world().resource::<Caught>().0.len(), 1);
        assert_eq!(app.world().resource::<CatchLog>().catches, 1);

        // Break contact, then touch again
        app.world_mut().get_mut::<PursuerStatus>(pursuer).unwrap().last = Some(report(false));
        app.update();
        app.world_mut().get_mut::<PursuerStatus>(pursuer).unwrap().last = Some(report(true));
        app.update();

        let caught = &app.world().resource::<Caught>().0;
        assert_eq!(caught.len(), 2);
        assert_eq!(caught[1].mode, PursuerMode::Chase);
        assert_eq!(app.world().resource::<CatchLog>().last_distance, Some(0.4));
    }

    #[test]
    fn catch_is_judged_where_the_body_lands() {
        use std::time::Duration;

        use bevy::time::TimeUpdateStrategy;

        use crate::config::PursuerConfig;
        use crate::maze::{Grid, GridCell, Level};
        use crate::resources::LevelState;

        let text = format!("{}\n#{}#\n{}", "#".repeat(12), ".".repeat(10), "#".repeat(12));
        let level = Level::new(Grid::parse(&text).unwrap(), 3.0, Vec2::ZERO);
        let at = |col| {
            let p = level.transform.grid_to_world(GridCell::new(1, col));
            Vec3::new(p.x, 0.35, p.y)
        };
        let player = at(6);
        let start = at(5);

        let mut app = setup_app();
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / 60.0,
        )));
        app.insert_resource(PursuerTarget(SceneRef::LogicalOnly(player)));
        app.insert_resource(LevelState(level.clone()));
        app.add_systems(Update, drive_pursuer.before(detect_catch));
        let pursuer = app
            .world_mut()
            .spawn((
                Pursuer(PursuerAgent::new(PursuerConfig::default(), 3)),
                PursuerBody(JumpAnimator::new(start, 1.0, JumpParams::default())),
                PursuerStatus::default(),
                Transform::from_translation(start),
            ))
            .id();

        for _ in 0..400 {
            app.update();
            if !app.world().resource::<Caught>().0.is_empty() {
                break;
            }
        }

        let caught = app.world().resource::<Caught>().0.clone();
        assert_eq!(caught.len(), 1);
        let body = app.world().get::<Transform>(pursuer).unwrap().translation;
        let gap = Vec2::new(body.x - player.x, body.z - player.z).length();
        assert!((caught[0].distance - gap).abs() < 1e-4);
        assert!(gap <= 0.45 + 0.22 + 0.15 + 1e-4, "caught {} away", gap);
    }

    #[test]
    fn no_report_no_catch() {
        let mut app = setup_app();
        app.world_mut().spawn(PursuerStatus::default());
        app.update();
        assert!(app.world().resource::<Caught>().0.is_empty());
    }
}
