//! Bounded A* over the maze grid.
//!
//! 4-connected, unit step cost, Manhattan heuristic. The iteration budget
//! caps node expansions so a single search can never stall a frame.

use micromegas_tracing::prelude::*;
use pathfinding::prelude::astar;

use crate::maze::{Grid, GridCell, PassableSet};

/// Expansion budget used when the caller has no better number.
pub const DEFAULT_MAX_ITERATIONS: usize = 5000;

/// Shortest 4-connected path from `start` to `goal`, both included.
///
/// Returns `[start]` when `start == goal`, and an empty path when the goal
/// is unreachable or `max_iterations` expansions were spent first.
#[span_fn]
pub fn find_path(
    grid: &Grid,
    start: GridCell,
    goal: GridCell,
    passable: &PassableSet,
    max_iterations: usize,
) -> Vec<GridCell> {
    if start == goal {
        return vec![start];
    }

    // Once the budget is spent every node looks like a dead end, which
    // drains the open set and makes astar give up.
    let mut expansions = 0usize;
    let path = astar(
        &start,
        |cell| {
            if expansions >= max_iterations {
                return Vec::new();
            }
            expansions += 1;
            grid.neighbors(*cell, passable)
                .into_iter()
                .map(|n| (n, 1u32))
                .collect::<Vec<_>>()
        },
        |cell| cell.manhattan(goal),
        |cell| *cell == goal,
    );

    match path {
        Some((steps, _cost)) => steps,
        None => {
            if expansions >= max_iterations {
                debug!("path search budget exhausted after {} expansions", expansions);
            }
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
