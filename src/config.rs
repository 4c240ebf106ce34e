//! Tunable numbers for the pursuer and the player.
//!
//! Loaded from an optional JSON file. Any field left out of the file keeps
//! its default, so a file only needs to name what it changes.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::maze::{PassableSet, Tile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PursuerConfig {
    /// Body radius used by catch detection.
    pub radius: f32,
    /// Height of the body above the maze floor.
    pub hover_height: f32,
    pub turn_rate_deg: f32,
    /// Inside this distance the pursuer needs sight to chase.
    pub wander_radius: f32,
    pub wander_reach_cells: i32,
    pub wander_attempts: u32,
    pub chase_repath_secs: f32,
    pub seek_repath_secs: f32,
    pub wander_repath_secs: f32,
    /// Manhattan shift of the chase goal that forces an early repath.
    pub chase_goal_shift_cells: u32,
    pub pounce_margin: f32,
    pub pounce_overshoot: f32,
    pub pounce_max_distance: f32,
    pub pounce_catch_bonus: f32,
    pub waypoint_epsilon: f32,
    pub max_path_iterations: usize,
    pub nearest_walkable_visits: usize,
    /// Delay between level start and the pursuer appearing.
    pub spawn_delay_secs: f32,
    /// Tiles the pursuer may enter. Empty means every tile but a wall.
    pub passable: Vec<char>,
}

impl Default for PursuerConfig {
    fn default() -> Self {
        Self {
            radius: 0.45,
            hover_height: 0.35,
            turn_rate_deg: 360.0,
            wander_radius: 10.0,
            wander_reach_cells: 6,
            wander_attempts: 200,
            chase_repath_secs: 0.25,
            seek_repath_secs: 0.35,
            wander_repath_secs: 1.25,
            chase_goal_shift_cells: 2,
            pounce_margin: 1.0,
            pounce_overshoot: 0.5,
            pounce_max_distance: 2.0,
            pounce_catch_bonus: 0.15,
            waypoint_epsilon: 0.05,
            max_path_iterations: crate::ai::path::DEFAULT_MAX_ITERATIONS,
            nearest_walkable_visits: 64,
            spawn_delay_secs: 3.0,
            passable: Vec::new(),
        }
    }
}

impl PursuerConfig {
    pub fn passable_set(&self) -> PassableSet {
        if self.passable.is_empty() {
            PassableSet::pursuer_default()
        } else {
            PassableSet::only(self.passable.iter().copied().map(Tile::from_char))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub speed: f32,
    pub radius: f32,
    /// Extra clearance kept from wall cells.
    pub padding: f32,
    /// Key pickup and escape distance, in cells.
    pub pickup_reach_cells: f32,
    /// Distance from a lock cell's centre at which a matching key opens
    /// it, in cells. Must exceed half a cell plus radius and padding, since
    /// the player cannot step into a closed lock.
    pub unlock_reach_cells: f32,
    /// Tiles the player may enter. Empty means the three floor tiles.
    pub passable: Vec<char>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 12.0,
            radius: 0.22,
            padding: 0.35,
            pickup_reach_cells: 0.6,
            unlock_reach_cells: 0.8,
            passable: Vec::new(),
        }
    }
}

impl PlayerConfig {
    pub fn passable_set(&self) -> PassableSet {
        if self.passable.is_empty() {
            PassableSet::player_default()
        } else {
            PassableSet::only(self.passable.iter().copied().map(Tile::from_char))
        }
    }
}

#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub pursuer: PursuerConfig,
    pub player: PlayerConfig,
}

impl Tuning {
    pub fn from_json(text: &str, path: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }
}

/// Read tuning from `path`. A missing file is not an error and yields the
/// defaults.
pub fn load_tuning(path: impl AsRef<Path>) -> Result<Tuning, ConfigError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    match std::fs::read_to_string(path) {
        Ok(text) => Tuning::from_json(&text, &display),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Tuning::default()),
        Err(source) => Err(ConfigError::Io {
            path: display,
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_values() {
        let t = Tuning::default();
        assert_eq!(t.pursuer.chase_repath_secs, 0.25);
        assert_eq!(t.pursuer.seek_repath_secs, 0.35);
        assert_eq!(t.pursuer.wander_repath_secs, 1.25);
        assert_eq!(t.pursuer.max_path_iterations, 5000);
        assert_eq!(t.player.speed, 12.0);
        assert_eq!(t.player.radius, 0.22);
        assert_eq!(t.player.pickup_reach_cells, 0.6);
        // A closed lock is reachable from the neighbouring cell
        assert!(t.player.unlock_reach_cells > 0.5 + (t.player.radius + t.player.padding) / 3.0);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let t = Tuning::from_json(r#"{ "pursuer": { "wander_radius": 4.5 } }"#, "inline").unwrap();
        assert_eq!(t.pursuer.wander_radius, 4.5);
        assert_eq!(t.pursuer.radius, 0.45);
        assert_eq!(t.player, PlayerConfig::default());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Tuning::from_json("{ pursuer: ", "bad.json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let t = load_tuning("assets/config/does_not_exist.json").unwrap();
        assert_eq!(t, Tuning::default());
    }

    #[test]
    fn passable_symbols_override_defaults() {
        let cfg = PursuerConfig {
            passable: vec!['.', 'L'],
            ..PursuerConfig::default()
        };
        let set = cfg.passable_set();
        assert!(set.contains(Tile::FloorA));
        assert!(set.contains(Tile::Lock));
        assert!(!set.contains(Tile::LockWall));

        let default = PursuerConfig::default().passable_set();
        assert!(default.contains(Tile::LockWall));
        assert!(!default.contains(Tile::Wall));
    }
}
