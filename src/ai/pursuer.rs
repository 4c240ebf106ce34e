//! The pursuer's decision loop.
//!
//! Each tick the agent reads its body position from the [`Avatar`], decides
//! between wandering, chasing, seeking the last place it saw the player and
//! pouncing, keeps a grid path to the current goal, and hands one steering
//! request back to the avatar. Catch detection is reported, never acted on.

use bevy::math::{Vec2, Vec3};
use micromegas_tracing::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::path::find_path;
use super::sight::is_visible;
use crate::avatar::Avatar;
use crate::config::{PlayerConfig, PursuerConfig};
use crate::maze::{Grid, GridCell, GridTransform, Level, PassableSet, planar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PursuerMode {
    /// No maze to move in.
    #[default]
    Idle,
    Wander,
    Chase,
    Seek,
    Pounce,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    /// Unit vector on the XZ plane.
    pub direction: Vec3,
    pub distance: f32,
}

/// What happened during one [`PursuerAgent::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub mode: PursuerMode,
    pub caught: bool,
    pub steering: Option<Steering>,
    pub repathed: bool,
    pub in_sight: bool,
    /// XZ distance to the player.
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub struct PursuerAgent {
    config: PursuerConfig,
    player_radius: f32,
    cell: GridCell,
    position: Vec3,
    mode: PursuerMode,
    last_known_player: Option<GridCell>,
    path: Vec<GridCell>,
    path_index: usize,
    repath_timer: f32,
    chase_goal: Option<GridCell>,
    facing_yaw: f32,
    caught_latch: bool,
    rng: StdRng,
}

impl PursuerAgent {
    pub fn new(config: PursuerConfig, seed: u64) -> Self {
        Self {
            config,
            player_radius: PlayerConfig::default().radius,
            cell: GridCell::default(),
            position: Vec3::ZERO,
            mode: PursuerMode::Wander,
            last_known_player: None,
            path: Vec::new(),
            path_index: 0,
            repath_timer: 0.0,
            chase_goal: None,
            facing_yaw: 0.0,
            caught_latch: false,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_player_radius(mut self, radius: f32) -> Self {
        self.player_radius = radius;
        self
    }

    /// World position of the walkable cell nearest the maze centre, at
    /// hover height.
    pub fn spawn_position(level: &Level, config: &PursuerConfig) -> Vec3 {
        if level.is_empty() {
            return Vec3::new(0.0, config.hover_height, 0.0);
        }
        let cell = level.grid.spawn_cell_near_center(&level.pursuer_passable);
        let p = level.transform.grid_to_world(cell);
        Vec3::new(p.x, config.hover_height, p.y)
    }

    pub fn config(&self) -> &PursuerConfig {
        &self.config
    }

    pub fn mode(&self) -> PursuerMode {
        self.mode
    }

    pub fn cell(&self) -> GridCell {
        self.cell
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn last_known_player(&self) -> Option<GridCell> {
        self.last_known_player
    }

    pub fn path(&self) -> &[GridCell] {
        &self.path
    }

    pub fn facing_yaw(&self) -> f32 {
        self.facing_yaw
    }

    /// Whether a circle of `radius` at `point` touches the pursuer body.
    /// The body reaches a little further while pouncing.
    pub fn collides_with_point(&self, point: Vec3, radius: f32) -> bool {
        let mut reach = self.config.radius + radius;
        if self.mode == PursuerMode::Pounce {
            reach += self.config.pounce_catch_bonus;
        }
        planar(self.position).distance(planar(point)) <= reach
    }

    /// Re-read the body after the animation moved it this frame and redo
    /// the catch check from there. The latch follows the new result.
    pub fn sync_with_body(&mut self, player: Vec3, avatar: &impl Avatar) -> bool {
        self.position = avatar.position();
        self.register_catch(player)
    }

    pub fn update(
        &mut self,
        dt: f32,
        player: Vec3,
        level: &Level,
        avatar: &mut impl Avatar,
    ) -> TickReport {
        span_scope!("pursuer_tick");
        self.position = avatar.position();
        let me = planar(self.position);
        let target = planar(player);
        let distance = me.distance(target);

        let cells = level
            .transform
            .world_to_grid(me)
            .zip(level.transform.world_to_grid(target));
        let Some((my_cell, player_cell)) = cells.filter(|_| !level.is_empty()) else {
            return self.idle(player, distance, avatar);
        };
        self.cell = my_cell;

        let grid = &level.grid;
        let passable = &level.pursuer_passable;
        let in_radius = distance <= self.config.wander_radius;
        let in_sight = is_visible(grid, my_cell, player_cell, passable);
        if in_sight {
            self.last_known_player = Some(player_cell);
        }
        self.repath_timer -= dt;

        let previous = self.mode;
        let mut repathed = false;
        let pounce = in_sight
            && my_cell.manhattan(player_cell) <= 1
            && distance < self.config.radius + self.config.pounce_margin
            && !self.caught_latch;

        let steering = if pounce {
            self.mode = PursuerMode::Pounce;
            self.path.clear();
            let direction = flat_direction(target - me).unwrap_or_else(|| self.facing_vector());
            Some(Steering {
                direction,
                distance: (distance + self.config.pounce_overshoot)
                    .min(self.config.pounce_max_distance),
            })
        } else {
            let (mode, goal) =
                self.select_mode(my_cell, player_cell, in_radius, in_sight, grid, passable);
            self.mode = mode;

            let goal_shifted = mode == PursuerMode::Chase
                && match (self.chase_goal, goal) {
                    (Some(old), Some(new)) => {
                        old.manhattan(new) >= self.config.chase_goal_shift_cells
                    }
                    (old, new) => old != new,
                };
            if mode != previous || goal_shifted || self.repath_timer <= 0.0 {
                self.repath(mode, goal, my_cell, grid, passable);
                repathed = true;
                if mode == PursuerMode::Seek && self.path.is_empty() {
                    self.last_known_player = None;
                    self.mode = PursuerMode::Wander;
                    self.repath(PursuerMode::Wander, None, my_cell, grid, passable);
                }
            }

            let steering = self.follow_path(me, &level.transform);
            if self.mode == PursuerMode::Seek && self.path_index >= self.path.len() {
                self.last_known_player = None;
            }
            steering
        };

        if self.mode != previous {
            debug!("pursuer mode {:?} -> {:?}", previous, self.mode);
        }

        match steering {
            Some(s) => {
                self.facing_yaw = turn_towards(
                    self.facing_yaw,
                    yaw_of(s.direction),
                    self.config.turn_rate_deg * dt,
                );
                avatar.set_steering(s.direction, s.distance);
            }
            None => avatar.set_steering(self.facing_vector(), 0.0),
        }
        avatar.set_facing(self.facing_yaw);

        let caught = self.register_catch(player);
        TickReport {
            mode: self.mode,
            caught,
            steering,
            repathed,
            in_sight,
            distance,
        }
    }

    fn idle(&mut self, player: Vec3, distance: f32, avatar: &mut impl Avatar) -> TickReport {
        self.mode = PursuerMode::Idle;
        self.path.clear();
        self.path_index = 0;
        avatar.set_steering(self.facing_vector(), 0.0);
        let caught = self.register_catch(player);
        TickReport {
            mode: PursuerMode::Idle,
            caught,
            steering: None,
            repathed: false,
            in_sight: false,
            distance,
        }
    }

    /// Catch result for this tick. The latch holds while the player stays in
    /// reach and suppresses another pounce.
    fn register_catch(&mut self, player: Vec3) -> bool {
        let caught = self.collides_with_point(player, self.player_radius);
        self.caught_latch = caught;
        caught
    }

    fn select_mode(
        &mut self,
        my_cell: GridCell,
        player_cell: GridCell,
        in_radius: bool,
        in_sight: bool,
        grid: &Grid,
        passable: &PassableSet,
    ) -> (PursuerMode, Option<GridCell>) {
        if !in_radius {
            let goal =
                grid.nearest_walkable(player_cell, passable, self.config.nearest_walkable_visits);
            return (PursuerMode::Chase, goal);
        }
        if in_sight {
            return (PursuerMode::Chase, Some(player_cell));
        }
        match self.last_known_player {
            Some(last) if last != my_cell => (PursuerMode::Seek, Some(last)),
            Some(_) => {
                self.last_known_player = None;
                (PursuerMode::Wander, None)
            }
            None => (PursuerMode::Wander, None),
        }
    }

    fn repath(
        &mut self,
        mode: PursuerMode,
        goal: Option<GridCell>,
        my_cell: GridCell,
        grid: &Grid,
        passable: &PassableSet,
    ) {
        let goal = match mode {
            PursuerMode::Wander => self.pick_wander_goal(my_cell, grid, passable),
            _ => goal,
        };
        self.path = goal
            .map(|g| find_path(grid, my_cell, g, passable, self.config.max_path_iterations))
            .unwrap_or_default();
        self.path_index = 1;
        self.repath_timer = match mode {
            PursuerMode::Chase => self.config.chase_repath_secs,
            PursuerMode::Seek => self.config.seek_repath_secs,
            _ => self.config.wander_repath_secs,
        };
        self.chase_goal = if mode == PursuerMode::Chase { goal } else { None };
    }

    /// Random walkable cell within `wander_reach_cells` on each axis, other
    /// than `from`. `None` after `wander_attempts` misses.
    fn pick_wander_goal(
        &mut self,
        from: GridCell,
        grid: &Grid,
        passable: &PassableSet,
    ) -> Option<GridCell> {
        let reach = self.config.wander_reach_cells.max(0);
        if reach == 0 {
            return None;
        }
        (0..self.config.wander_attempts).find_map(|_| {
            let candidate = from.offset(
                self.rng.gen_range(-reach..=reach),
                self.rng.gen_range(-reach..=reach),
            );
            (candidate != from && grid.is_walkable(candidate, passable)).then_some(candidate)
        })
    }

    fn follow_path(&mut self, me: Vec2, transform: &GridTransform) -> Option<Steering> {
        while self.path_index < self.path.len() {
            let waypoint = transform.grid_to_world(self.path[self.path_index]);
            let delta = waypoint - me;
            let d = delta.length();
            if d <= self.config.waypoint_epsilon {
                self.path_index += 1;
                continue;
            }
            return flat_direction(delta).map(|direction| Steering {
                direction,
                distance: d.min(transform.cell_size),
            });
        }
        None
    }

    fn facing_vector(&self) -> Vec3 {
        let yaw = self.facing_yaw.to_radians();
        Vec3::new(yaw.sin(), 0.0, yaw.cos())
    }
}

/// Shortest signed turn from `current` toward `target` (degrees), capped
/// at `max_delta`, normalized to [0, 360).
pub fn turn_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = (target - current + 180.0).rem_euclid(360.0) - 180.0;
    let step = delta.clamp(-max_delta.abs(), max_delta.abs());
    (current + step).rem_euclid(360.0)
}

/// Heading of an XZ direction in degrees; 0 faces +Z, 90 faces +X.
pub fn yaw_of(direction: Vec3) -> f32 {
    direction.x.atan2(direction.z).to_degrees().rem_euclid(360.0)
}

fn flat_direction(delta: Vec2) -> Option<Vec3> {
    delta
        .try_normalize()
        .map(|d| Vec3::new(d.x, 0.0, d.y))
}
