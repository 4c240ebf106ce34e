//! Smooth grid-based wall collision for free-moving bodies (the player).
//!
//! Positions are planar (x, z). A body may stand anywhere inside a passable
//! cell but is pushed back from the faces of blocked neighbours, and slides
//! along walls when a move would enter a blocked cell.

use bevy::math::Vec2;

use super::grid::{Grid, GridCell, PassableSet};
use super::transform::GridTransform;

/// Collision queries against one grid for one passable set.
pub struct WallCollider<'a> {
    grid: &'a Grid,
    transform: &'a GridTransform,
    passable: &'a PassableSet,
}

impl<'a> WallCollider<'a> {
    pub fn new(grid: &'a Grid, transform: &'a GridTransform, passable: &'a PassableSet) -> Self {
        Self {
            grid,
            transform,
            passable,
        }
    }

    fn cell_passable(&self, cell: Option<GridCell>) -> bool {
        cell.is_some_and(|c| self.grid.is_walkable(c, self.passable))
    }

    /// Whether a point may be occupied. With `padding > 0`, a point closer
    /// than `cell_size / 2 + padding` to the centre of a nearby blocked cell
    /// is rejected too. Everything is passable when there is no maze.
    pub fn is_position_passable(&self, p: Vec2, padding: f32) -> bool {
        if self.grid.is_empty() {
            return true;
        }
        let Some(cell) = self.transform.world_to_grid_checked(p) else {
            return false;
        };
        if !self.grid.is_walkable(cell, self.passable) {
            return false;
        }
        if padding <= 0.0 {
            return true;
        }

        let reach = self.transform.cell_size * 0.5 + padding;
        for dx in [-padding, 0.0, padding] {
            for dz in [-padding, 0.0, padding] {
                if dx == 0.0 && dz == 0.0 {
                    continue;
                }
                let Some(nearby) = self.transform.world_to_grid_checked(p + Vec2::new(dx, dz))
                else {
                    continue;
                };
                if nearby != cell
                    && !self.grid.is_walkable(nearby, self.passable)
                    && p.distance(self.transform.grid_to_world(nearby)) < reach
                {
                    return false;
                }
            }
        }
        true
    }

    /// Resolve a move from `from` to `to` for a body of `radius`.
    ///
    /// Order of preference: the full move, pushed out of any adjacent wall
    /// it overlaps; a slide along one axis; staying put.
    pub fn resolve(&self, from: Vec2, to: Vec2, radius: f32) -> Vec2 {
        if self.grid.is_empty() {
            return to;
        }

        if let Some(cell) = self
            .transform
            .world_to_grid_checked(to)
            .filter(|c| self.grid.is_walkable(*c, self.passable))
        {
            return self.push_out_of_walls(cell, to, radius);
        }

        let slide_x = Vec2::new(to.x, from.y);
        let slide_z = Vec2::new(from.x, to.y);
        let x_ok = self.cell_passable(self.transform.world_to_grid_checked(slide_x));
        let z_ok = self.cell_passable(self.transform.world_to_grid_checked(slide_z));

        match (x_ok, z_ok) {
            (true, true) => {
                if (to.x - from.x).abs() > (to.y - from.y).abs() {
                    slide_x
                } else {
                    slide_z
                }
            }
            (true, false) => slide_x,
            (false, true) => slide_z,
            (false, false) => from,
        }
    }

    fn push_out_of_walls(&self, cell: GridCell, p: Vec2, radius: f32) -> Vec2 {
        let safe = self.transform.cell_size * 0.5 + radius;
        let mut out = p;
        for neighbor in cell.orthogonal() {
            if self.grid.is_walkable(neighbor, self.passable) {
                continue;
            }
            let wall = self.transform.grid_to_world(neighbor);
            let dist = out.distance(wall);
            if dist > 0.0 && dist < safe {
                out += (out - wall) / dist * (safe - dist);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Column 1..3 open on rows 1..3; everything else wall.
    const ROOM: &str = "\
#####
#...#
#...#
#...#
#####";

    fn setup() -> (Grid, GridTransform, PassableSet) {
        let grid = Grid::parse(ROOM).unwrap();
        let transform = GridTransform::new(&grid, 2.0, Vec2::ZERO);
        (grid, transform, PassableSet::player_default())
    }

    #[test]
    fn free_move_inside_room_is_untouched() {
        let (grid, transform, passable) = setup();
        let collider = WallCollider::new(&grid, &transform, &passable);
        let center = transform.grid_to_world(GridCell::new(2, 2));
        let to = center + Vec2::new(0.3, 0.2);
        assert_eq!(collider.resolve(center, to, 0.2), to);
    }

    #[test]
    fn move_into_wall_is_blocked() {
        let (grid, transform, passable) = setup();
        let collider = WallCollider::new(&grid, &transform, &passable);
        let start = transform.grid_to_world(GridCell::new(2, 1));
        // Straight into the left wall (column 0)
        let to = transform.grid_to_world(GridCell::new(2, 0));
        assert_eq!(collider.resolve(start, to, 0.2), start);
    }

    #[test]
    fn diagonal_move_slides_along_wall() {
        let (grid, transform, passable) = setup();
        let collider = WallCollider::new(&grid, &transform, &passable);
        let start = transform.grid_to_world(GridCell::new(2, 1));
        // Into the wall on X, but also along Z by one cell: slide keeps Z only
        let to = Vec2::new(start.x - 2.0, start.y + 1.2);
        let out = collider.resolve(start, to, 0.2);
        assert_eq!(out.x, start.x);
        assert_eq!(out.y, to.y);
    }

    #[test]
    fn push_out_keeps_radius_from_wall_face() {
        let (grid, transform, passable) = setup();
        let collider = WallCollider::new(&grid, &transform, &passable);
        let cell = transform.grid_to_world(GridCell::new(2, 1));
        // Hug the left wall: 0.1 from the face, body radius 0.3
        let to = Vec2::new(cell.x - 0.9, cell.y);
        let out = collider.resolve(cell, to, 0.3);
        let wall = transform.grid_to_world(GridCell::new(2, 0));
        assert!(out.distance(wall) >= 1.0 + 0.3 - 1e-4);
    }

    #[test]
    fn padding_rejects_points_near_walls() {
        let (grid, transform, passable) = setup();
        let collider = WallCollider::new(&grid, &transform, &passable);
        let cell = transform.grid_to_world(GridCell::new(2, 1));
        assert!(collider.is_position_passable(cell, 0.35));
        assert!(collider.is_position_passable(Vec2::new(cell.x - 0.8, cell.y), 0.0));
        assert!(!collider.is_position_passable(Vec2::new(cell.x - 0.8, cell.y), 0.35));
        // Inside a wall cell
        assert!(!collider.is_position_passable(Vec2::ZERO, 0.0));
        // Off the grid
        assert!(!collider.is_position_passable(Vec2::new(-50.0, 0.0), 0.0));
    }

    #[test]
    fn no_maze_means_no_walls() {
        let grid = Grid::empty();
        let transform = GridTransform::centered(&grid, 3.0, Vec2::ZERO);
        let passable = PassableSet::player_default();
        let collider = WallCollider::new(&grid, &transform, &passable);
        let to = Vec2::new(4.0, 4.0);
        assert_eq!(collider.resolve(Vec2::ZERO, to, 0.2), to);
        assert!(collider.is_position_passable(to, 1.0));
    }
}
