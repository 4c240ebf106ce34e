//! Keys, locks and the escape point.
//!
//! Keys are picked up by walking close to them. A lock opens when the
//! player stands next to it holding a key of its colour, and its cell turns
//! into floor. Once every lock is open the escape point goes live.

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::app_state::AppState;
use crate::components::{Key, KeyColor, LevelEntity, Lock, Player};
use crate::config::Tuning;
use crate::events::{EscapeReached, KeyCollected, LockOpened};
use crate::maze::{Grid, GridTransform, Tile, planar};
use crate::plugins::GameSet;
use crate::resources::{CollectedKeys, EscapeState, LevelConfig, LevelState};

pub struct CollectiblePlugin;

impl Plugin for CollectiblePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CollectedKeys>();
        app.init_resource::<EscapeState>();
        app.add_systems(OnEnter(AppState::Playing), spawn_keys_and_locks);
        app.add_systems(
            Update,
            (collect_keys, open_locks, check_escape)
                .chain()
                .in_set(GameSet::Interact),
        );
    }
}

/// Colour of the `index`-th lock in reading order.
pub fn lock_color(index: usize) -> KeyColor {
    KeyColor::ALL[index % KeyColor::ALL.len()]
}

/// World (x, z) of the escape point: midway between the first pair of
/// vertically stacked lock cells, or on the first lock cell when none are
/// stacked. `None` when the maze has no locks.
pub fn escape_point(grid: &Grid, transform: &GridTransform) -> Option<Vec2> {
    let locks = grid.cells_of(Tile::Lock);
    let stacked = locks
        .iter()
        .find(|cell| grid.tile_at(cell.offset(1, 0)) == Some(Tile::Lock));
    match stacked {
        Some(top) => {
            let a = transform.grid_to_world(*top);
            let b = transform.grid_to_world(top.offset(1, 0));
            Some((a + b) * 0.5)
        }
        None => locks.first().map(|cell| transform.grid_to_world(*cell)),
    }
}

/// Lay out this level's keys and locks and reset the key ring.
#[span_fn]
pub fn spawn_keys_and_locks(
    mut commands: Commands,
    level: Res<LevelState>,
    config: Res<LevelConfig>,
) {
    let mut keys = 0;
    for spot in &config.keys {
        if !level.grid.is_walkable(spot.cell, &level.player_passable) {
            warn!(
                "{:?} key at {:?} is off the player's floor; skipped",
                spot.color, spot.cell
            );
            continue;
        }
        let p = level.transform.grid_to_world(spot.cell);
        commands.spawn((Key(spot.color), LevelEntity, Transform::from_xyz(p.x, 0.0, p.y)));
        keys += 1;
    }

    let locks = level.grid.cells_of(Tile::Lock);
    for (i, cell) in locks.iter().enumerate() {
        let p = level.transform.grid_to_world(*cell);
        commands.spawn((
            Lock {
                color: lock_color(i),
                cell: *cell,
            },
            LevelEntity,
            Transform::from_xyz(p.x, 0.0, p.y),
        ));
    }

    commands.insert_resource(CollectedKeys::default());
    commands.insert_resource(EscapeState {
        point: escape_point(&level.grid, &level.transform),
        locks_remaining: locks.len(),
        open: false,
        reached: false,
    });
    info!("placed {} keys and {} locks", keys, locks.len());
}

/// Pick up the nearest key within reach, one per frame.
fn collect_keys(
    mut commands: Commands,
    level: Res<LevelState>,
    tuning: Res<Tuning>,
    mut collected: ResMut<CollectedKeys>,
    players: Query<&Transform, With<Player>>,
    keys: Query<(Entity, &Key, &Transform)>,
) {
    let Ok(player) = players.single() else {
        return;
    };
    let here = planar(player.translation);
    let reach = tuning.player.pickup_reach_cells * level.transform.cell_size;

    let nearest = keys
        .iter()
        .map(|(entity, key, t)| (entity, key.0, here.distance(planar(t.translation))))
        .filter(|(_, _, d)| *d <= reach)
        .min_by(|a, b| a.2.total_cmp(&b.2));
    let Some((entity, color, _)) = nearest else {
        return;
    };

    commands.entity(entity).despawn();
    collected.0.push(color);
    info!("picked up {:?} key, {} held", color, collected.0.len());
    commands.trigger(KeyCollected {
        color,
        total: collected.0.len(),
    });
}

/// Open every lock in reach whose colour the player holds. Keys are not
/// used up.
fn open_locks(
    mut commands: Commands,
    mut level: ResMut<LevelState>,
    tuning: Res<Tuning>,
    collected: Res<CollectedKeys>,
    mut escape: ResMut<EscapeState>,
    players: Query<&Transform, With<Player>>,
    locks: Query<(Entity, &Lock)>,
) {
    let Ok(player) = players.single() else {
        return;
    };
    let here = planar(player.translation);
    let reach = tuning.player.unlock_reach_cells * level.transform.cell_size;

    for (entity, lock) in &locks {
        let center = level.transform.grid_to_world(lock.cell);
        if here.distance(center) > reach || !collected.has(lock.color) {
            continue;
        }

        level.grid.set_tile(lock.cell, Tile::FloorA);
        commands.entity(entity).despawn();
        escape.locks_remaining = escape.locks_remaining.saturating_sub(1);
        info!(
            "{:?} lock at {:?} opened, {} left",
            lock.color, lock.cell, escape.locks_remaining
        );
        commands.trigger(LockOpened {
            color: lock.color,
            cell: lock.cell,
        });

        if escape.locks_remaining == 0 && escape.point.is_some() && !escape.open {
            escape.open = true;
            info!("all locks open, escape point is live");
        }
    }
}

fn check_escape(
    mut commands: Commands,
    level: Res<LevelState>,
    tuning: Res<Tuning>,
    mut escape: ResMut<EscapeState>,
    players: Query<&Transform, With<Player>>,
) {
    if !escape.open || escape.reached {
        return;
    }
    let (Some(point), Ok(player)) = (escape.point, players.single()) else {
        return;
    };
    let reach = tuning.player.pickup_reach_cells * level.transform.cell_size;
    if planar(player.translation).distance(point) <= reach {
        escape.reached = true;
        info!("player reached the escape point");
        commands.trigger(EscapeReached { position: point });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::{GridCell, Level};
    use crate::resources::{KeySpot, MazeSource};

    // Two corridors joined through a single lock cell
    const VAULT: &str = "\
#######
#.....#
###L###
#.....#
#######";

    #[derive(Resource, Default)]
    struct Seen {
        keys: Vec<KeyCollected>,
        locks: Vec<LockOpened>,
        escapes: usize,
    }

    fn on_key(trigger: On<KeyCollected>, mut seen: ResMut<Seen>) {
        seen.keys.push(*trigger.event());
    }

    fn on_lock(trigger: On<LockOpened>, mut seen: ResMut<Seen>) {
        seen.locks.push(*trigger.event());
    }

    fn on_escape(_trigger: On<EscapeReached>, mut seen: ResMut<Seen>) {
        seen.escapes += 1;
    }

    fn setup_app(maze: &str, keys: Vec<KeySpot>) -> App {
        let level = Level::new(Grid::parse(maze).unwrap(), 3.0, Vec2::ZERO);
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(LevelConfig {
            maze: MazeSource::Inline(maze.to_string()),
            cell_size: 3.0,
            map_center: Vec2::ZERO,
            tuning_file: None,
            seed: Some(1),
            keys,
        });
        app.insert_resource(LevelState(level));
        app.init_resource::<Tuning>();
        app.init_resource::<Seen>();
        app.add_observer(on_key);
        app.add_observer(on_lock);
        app.add_observer(on_escape);
        app.add_systems(Startup, spawn_keys_and_locks);
        app.add_systems(Update, (collect_keys, open_locks, check_escape).chain());
        app.world_mut().spawn((Player, Transform::default()));
        app
    }

    fn world(app: &App, cell: GridCell) -> Vec2 {
        app.world()
            .resource::<LevelState>()
            .transform
            .grid_to_world(cell)
    }

    fn place_player(app: &mut App, p: Vec2) {
        let world = app.world_mut();
        let mut query = world.query_filtered::<&mut Transform, With<Player>>();
        let mut transform = query.single_mut(world).unwrap();
        transform.translation = Vec3::new(p.x, 0.0, p.y);
    }

    /// A spot in the corridor cell above the lock, close enough to reach it.
    fn beside_lock(app: &App) -> Vec2 {
        let corridor = world(app, GridCell::new(1, 3));
        let lock = world(app, GridCell::new(2, 3));
        corridor.lerp(lock, 0.3)
    }

    fn count<C: Component>(app: &mut App) -> usize {
        let world = app.world_mut();
        world.query::<&C>().iter(world).count()
    }

    #[test]
    fn key_is_picked_up_within_reach() {
        let mut app = setup_app(VAULT, vec![KeySpot::new(1, 1, KeyColor::White)]);
        let pos = world(&app, GridCell::new(1, 5));
        place_player(&mut app, pos);
        app.update();
        assert_eq!(count::<Key>(&mut app), 1);
        assert!(app.world().resource::<CollectedKeys>().0.is_empty());

        // 1.0 off the key's centre, inside 0.6 cells
        let near = world(&app, GridCell::new(1, 1)) + Vec2::new(1.0, 0.0);
        place_player(&mut app, near);
        app.update();
        app.update();

        assert_eq!(count::<Key>(&mut app), 0);
        assert_eq!(
            app.world().resource::<CollectedKeys>().0,
            vec![KeyColor::White]
        );
        let seen = app.world().resource::<Seen>();
        assert_eq!(seen.keys.len(), 1);
        assert_eq!(seen.keys[0].total, 1);
    }

    #[test]
    fn keys_off_the_floor_are_skipped() {
        let mut app = setup_app(
            VAULT,
            vec![
                KeySpot::new(0, 0, KeyColor::White),
                KeySpot::new(2, 3, KeyColor::Green),
                KeySpot::new(3, 2, KeyColor::Yellow),
            ],
        );
        app.update();
        assert_eq!(count::<Key>(&mut app), 1);
        assert_eq!(count::<Lock>(&mut app), 1);
    }

    #[test]
    fn lock_opens_only_for_its_colour() {
        let mut app = setup_app(VAULT, Vec::new());
        let lock_cell = GridCell::new(2, 3);
        let p = beside_lock(&app);
        place_player(&mut app, p);

        app.update();
        app.world_mut().resource_mut::<CollectedKeys>().0 = vec![KeyColor::Green];
        app.update();
        assert_eq!(count::<Lock>(&mut app), 1);
        {
            let level = app.world().resource::<LevelState>();
            assert_eq!(level.grid.tile_at(lock_cell), Some(Tile::Lock));
            assert!(!level.grid.is_walkable(lock_cell, &level.player_passable));
        }

        // First lock in reading order is white
        app.world_mut()
            .resource_mut::<CollectedKeys>()
            .0
            .push(KeyColor::White);
        app.update();
        app.update();

        assert_eq!(count::<Lock>(&mut app), 0);
        let level = app.world().resource::<LevelState>();
        assert!(level.grid.is_walkable(lock_cell, &level.player_passable));
        let seen = app.world().resource::<Seen>();
        assert_eq!(seen.locks.len(), 1);
        assert_eq!(seen.locks[0].color, KeyColor::White);
        assert_eq!(seen.locks[0].cell, lock_cell);

        let escape = app.world().resource::<EscapeState>();
        assert_eq!(escape.locks_remaining, 0);
        assert!(escape.open);
    }

    #[test]
    fn escape_fires_once_after_every_lock_opens() {
        let mut app = setup_app(VAULT, Vec::new());
        let lock = world(&app, GridCell::new(2, 3));

        // Standing on the escape point does nothing while it is locked
        place_player(&mut app, lock);
        app.update();
        app.update();
        assert_eq!(app.world().resource::<Seen>().escapes, 0);

        let p = beside_lock(&app);
        place_player(&mut app, p);
        app.world_mut().resource_mut::<CollectedKeys>().0 = vec![KeyColor::White];
        app.update();
        assert!(app.world().resource::<EscapeState>().open);

        place_player(&mut app, lock);
        for _ in 0..5 {
            app.update();
        }
        assert_eq!(app.world().resource::<Seen>().escapes, 1);
        assert!(app.world().resource::<EscapeState>().reached);
    }

    #[test]
    fn escape_point_prefers_stacked_locks() {
        let grid = Grid::parse("#L##\n#.L#\n#.L#\n####").unwrap();
        let transform = GridTransform::centered(&grid, 2.0, Vec2::ZERO);
        let a = transform.grid_to_world(GridCell::new(1, 2));
        let b = transform.grid_to_world(GridCell::new(2, 2));
        assert_eq!(escape_point(&grid, &transform), Some((a + b) * 0.5));

        let single = Grid::parse("#L#\n#.#").unwrap();
        let transform = GridTransform::centered(&single, 2.0, Vec2::ZERO);
        assert_eq!(
            escape_point(&single, &transform),
            Some(transform.grid_to_world(GridCell::new(0, 1)))
        );

        let none = Grid::parse("#.#").unwrap();
        let transform = GridTransform::centered(&none, 2.0, Vec2::ZERO);
        assert_eq!(escape_point(&none, &transform), None);
    }

    #[test]
    fn lock_colours_cycle() {
        assert_eq!(lock_color(0), KeyColor::White);
        assert_eq!(lock_color(1), KeyColor::Green);
        assert_eq!(lock_color(2), KeyColor::Yellow);
        assert_eq!(lock_color(3), KeyColor::White);
    }
}
