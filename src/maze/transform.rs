//! Grid ↔ world coordinate conversion.
//!
//! The maze lies on the world XZ plane. Planar points are carried in a
//! `Vec2` whose `x` is world X and whose `y` is world Z. Row 0 of the maze
//! text is the most positive Z.

use bevy::math::{Vec2, Vec3};

use super::grid::{Grid, GridCell};

/// Projects the XZ components of a world position into a planar `Vec2`.
pub fn planar(p: Vec3) -> Vec2 {
    Vec2::new(p.x, p.z)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTransform {
    /// World units per cell.
    pub cell_size: f32,
    /// World (x, z) of the centre of the bottom-left cell (last row, column 0).
    pub origin: Vec2,
    rows: usize,
    cols: usize,
}

impl GridTransform {
    pub fn new(grid: &Grid, cell_size: f32, origin: Vec2) -> Self {
        Self {
            cell_size,
            origin,
            rows: grid.height(),
            cols: grid.width(),
        }
    }

    /// Lay the grid out so its bounding rectangle is centred on `center`.
    pub fn centered(grid: &Grid, cell_size: f32, center: Vec2) -> Self {
        let extent = Vec2::new(grid.width() as f32, grid.height() as f32) * cell_size;
        let origin = center - extent / 2.0 + Vec2::splat(cell_size / 2.0);
        Self::new(grid, cell_size, origin)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// World (x, z) of a cell centre.
    pub fn grid_to_world(&self, cell: GridCell) -> Vec2 {
        let effective_row = self.rows as i32 - 1 - cell.row;
        Vec2::new(
            self.origin.x + cell.col as f32 * self.cell_size,
            self.origin.y + effective_row as f32 * self.cell_size,
        )
    }

    /// Continuous (row, col) before rounding, in the same orientation as
    /// [`GridCell`].
    fn fractional(&self, p: Vec2) -> (f32, f32) {
        let col = (p.x - self.origin.x) / self.cell_size;
        let effective_row = (p.y - self.origin.y) / self.cell_size;
        (self.rows as f32 - 1.0 - effective_row, col)
    }

    /// Nearest cell to a world point, clamped into the grid.
    /// None only when the grid has no cells.
    pub fn world_to_grid(&self, p: Vec2) -> Option<GridCell> {
        if self.rows == 0 || self.cols == 0 {
            return None;
        }
        let (row, col) = self.fractional(p);
        Some(GridCell::new(
            (row.round() as i32).clamp(0, self.rows as i32 - 1),
            (col.round() as i32).clamp(0, self.cols as i32 - 1),
        ))
    }

    /// Nearest cell to a world point, or None if the point falls outside
    /// the grid rectangle.
    pub fn world_to_grid_checked(&self, p: Vec2) -> Option<GridCell> {
        if self.rows == 0 || self.cols == 0 {
            return None;
        }
        let (row, col) = self.fractional(p);
        let cell = GridCell::new(row.round() as i32, col.round() as i32);
        let inside = cell.row >= 0
            && cell.col >= 0
            && (cell.row as usize) < self.rows
            && (cell.col as usize) < self.cols;
        inside.then_some(cell)
    }
}
