//! Grid line of sight.
//!
//! Rasterizes the segment between two cell centres with Bresenham's line
//! algorithm and fails on the first blocked cell strictly between them.
//! Resolution is one cell: two cells can "see" each other across a
//! diagonal gap that a continuous ray would clip.

use crate::maze::{Grid, GridCell, PassableSet};

/// True when every cell on the raster line between `from` and `to`,
/// excluding both endpoints, is walkable.
pub fn is_visible(grid: &Grid, from: GridCell, to: GridCell, passable: &PassableSet) -> bool {
    BresenhamLine::new(from, to)
        .filter(|cell| *cell != from && *cell != to)
        .all(|cell| grid.is_walkable(cell, passable))
}

/// Cells on the raster line from `start` to `end`, inclusive.
#[derive(Debug, Clone)]
pub struct BresenhamLine {
    current: GridCell,
    end: GridCell,
    dr: i32,
    dc: i32,
    step_r: i32,
    step_c: i32,
    err: i32,
    done: bool,
}

impl BresenhamLine {
    pub fn new(start: GridCell, end: GridCell) -> Self {
        let dr = (end.row - start.row).abs();
        let dc = (end.col - start.col).abs();
        Self {
            current: start,
            end,
            dr,
            dc,
            step_r: if start.row < end.row { 1 } else { -1 },
            step_c: if start.col < end.col { 1 } else { -1 },
            err: dr - dc,
            done: false,
        }
    }
}

impl Iterator for BresenhamLine {
    type Item = GridCell;

    fn next(&mut self) -> Option<GridCell> {
        if self.done {
            return None;
        }
        let cell = self.current;
        if cell == self.end {
            self.done = true;
            return Some(cell);
        }
        let e2 = 2 * self.err;
        if e2 > -self.dc {
            self.err -= self.dc;
            self.current.row += self.step_r;
        }
        if e2 < self.dr {
            self.err += self.dr;
            self.current.col += self.step_c;
        }
        Some(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::Tile;

    fn open(rows: usize, cols: usize) -> Grid {
        Grid::parse(&vec![".".repeat(cols); rows].join("\n")).unwrap()
    }

    #[test]
    fn line_includes_both_endpoints() {
        let cells: Vec<_> = BresenhamLine::new(GridCell::new(0, 0), GridCell::new(0, 3)).collect();
        assert_eq!(
            cells,
            vec![
                GridCell::new(0, 0),
                GridCell::new(0, 1),
                GridCell::new(0, 2),
                GridCell::new(0, 3)
            ]
        );
        let single: Vec<_> = BresenhamLine::new(GridCell::new(2, 2), GridCell::new(2, 2)).collect();
        assert_eq!(single, vec![GridCell::new(2, 2)]);
    }

    #[test]
    fn line_length_is_max_axis_delta() {
        let cells: Vec<_> = BresenhamLine::new(GridCell::new(5, 1), GridCell::new(1, 3)).collect();
        assert_eq!(cells.len(), 5);
        assert_eq!(cells.last(), Some(&GridCell::new(1, 3)));
        for pair in cells.windows(2) {
            assert!((pair[0].row - pair[1].row).abs() <= 1);
            assert!((pair[0].col - pair[1].col).abs() <= 1);
        }
    }

    #[test]
    fn wall_between_blocks_and_removal_restores() {
        let mut grid = open(5, 7);
        let passable = PassableSet::pursuer_default();
        let a = GridCell::new(2, 0);
        let b = GridCell::new(2, 6);
        assert!(is_visible(&grid, a, b, &passable));

        grid.set_tile(GridCell::new(2, 3), Tile::Wall);
        assert!(!is_visible(&grid, a, b, &passable));
        assert!(!is_visible(&grid, b, a, &passable));

        grid.set_tile(GridCell::new(2, 3), Tile::FloorA);
        assert!(is_visible(&grid, a, b, &passable));
    }

    #[test]
    fn endpoints_do_not_block() {
        let grid = Grid::parse("#.#").unwrap();
        let passable = PassableSet::pursuer_default();
        assert!(is_visible(&grid, GridCell::new(0, 0), GridCell::new(0, 2), &passable));
        assert!(is_visible(&grid, GridCell::new(0, 0), GridCell::new(0, 0), &passable));
    }

    #[test]
    fn visibility_uses_the_given_passable_set() {
        let grid = Grid::parse(".L.").unwrap();
        let a = GridCell::new(0, 0);
        let b = GridCell::new(0, 2);
        assert!(is_visible(&grid, a, b, &PassableSet::pursuer_default()));
        assert!(!is_visible(&grid, a, b, &PassableSet::player_default()));
    }

    #[test]
    fn diagonal_gap_is_seen_through() {
        // Walls on both sides of a diagonal step: the raster line steps
        // diagonally and never lands on a wall cell.
        let grid = Grid::parse(".#\n#.").unwrap();
        let passable = PassableSet::pursuer_default();
        assert!(is_visible(&grid, GridCell::new(0, 0), GridCell::new(1, 1), &passable));
    }
}
