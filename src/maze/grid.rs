//! Maze tile grid: parsing, walkability and neighbourhood queries.
//!
//! The grid is a ragged matrix of tiles. Reads past the end of a short row
//! or outside the grid are treated as blocked. Walkability is always asked
//! relative to a [`PassableSet`], since the player and the pursuer are
//! allowed onto different tiles.

use std::collections::HashSet;
use std::path::Path;

use pathfinding::prelude::bfs_reach;

use super::MazeError;

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// A (row, col) address in the maze. Row 0 is the first line of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GridCell {
    pub row: i32,
    pub col: i32,
}

impl GridCell {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn manhattan(&self, other: GridCell) -> u32 {
        (self.row - other.row).unsigned_abs() + (self.col - other.col).unsigned_abs()
    }

    pub fn offset(&self, dr: i32, dc: i32) -> GridCell {
        GridCell::new(self.row + dr, self.col + dc)
    }

    /// The four orthogonal neighbours, N/S/W/E.
    pub fn orthogonal(&self) -> [GridCell; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
        ]
    }
}

// ---------------------------------------------------------------------------
// Tiles
// ---------------------------------------------------------------------------

/// One maze symbol. Emoji are the shipped map format; the ASCII aliases
/// keep hand-written layouts (and tests) readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tile {
    Wall,
    LockWall,
    Lock,
    FloorA,
    FloorB,
    FloorC,
    Other(char),
}

impl Tile {
    pub fn from_char(c: char) -> Self {
        match c {
            '🟥' | '#' => Tile::Wall,
            '🟧' | '=' => Tile::LockWall,
            '🟩' | 'L' => Tile::Lock,
            '🟨' | '.' => Tile::FloorA,
            '🟪' | ':' => Tile::FloorB,
            '🟦' | 'o' => Tile::FloorC,
            other => Tile::Other(other),
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Tile::Wall => '🟥',
            Tile::LockWall => '🟧',
            Tile::Lock => '🟩',
            Tile::FloorA => '🟨',
            Tile::FloorB => '🟪',
            Tile::FloorC => '🟦',
            Tile::Other(c) => *c,
        }
    }
}

/// The set of tiles a mover may occupy.
///
/// Either an allow-list (`only`) or a deny-list (`all_except`). The player
/// walks floors only; the pursuer goes anywhere that is not a solid wall,
/// which lets it cut through lock cells the player has to open first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassableSet {
    tiles: HashSet<Tile>,
    inverted: bool,
}

impl PassableSet {
    pub fn only(tiles: impl IntoIterator<Item = Tile>) -> Self {
        Self {
            tiles: tiles.into_iter().collect(),
            inverted: false,
        }
    }

    pub fn all_except(tiles: impl IntoIterator<Item = Tile>) -> Self {
        Self {
            tiles: tiles.into_iter().collect(),
            inverted: true,
        }
    }

    pub fn player_default() -> Self {
        Self::only([Tile::FloorA, Tile::FloorB, Tile::FloorC])
    }

    pub fn pursuer_default() -> Self {
        Self::all_except([Tile::Wall])
    }

    pub fn contains(&self, tile: Tile) -> bool {
        self.tiles.contains(&tile) != self.inverted
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Parsed maze layout. Row lengths may differ.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<Tile>>,
    width: usize,
}

impl Grid {
    /// Parse maze text: one line per row, one `char` per cell.
    /// Blank and whitespace-only lines are skipped.
    pub fn parse(text: &str) -> Result<Self, MazeError> {
        let rows: Vec<Vec<Tile>> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.chars().map(Tile::from_char).collect())
            .collect();

        if rows.is_empty() {
            return Err(MazeError::Empty);
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Ok(Self { rows, width })
    }

    /// Read and parse a UTF-8 maze file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MazeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MazeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    /// The inert "no maze" grid.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Length of the longest row.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0 || self.width == 0
    }

    /// Whether `cell` lies inside the bounding rectangle.
    pub fn in_bounds(&self, cell: GridCell) -> bool {
        cell.row >= 0
            && cell.col >= 0
            && (cell.row as usize) < self.height()
            && (cell.col as usize) < self.width
    }

    /// Tile at a cell, or None when outside the grid or past a short row.
    pub fn tile_at(&self, cell: GridCell) -> Option<Tile> {
        if cell.row < 0 || cell.col < 0 {
            return None;
        }
        self.rows
            .get(cell.row as usize)
            .and_then(|row| row.get(cell.col as usize))
            .copied()
    }

    /// Replace a tile in place. Returns false if the cell does not exist.
    pub fn set_tile(&mut self, cell: GridCell, tile: Tile) -> bool {
        if cell.row < 0 || cell.col < 0 {
            return false;
        }
        match self
            .rows
            .get_mut(cell.row as usize)
            .and_then(|row| row.get_mut(cell.col as usize))
        {
            Some(slot) => {
                *slot = tile;
                true
            }
            None => false,
        }
    }

    pub fn is_walkable(&self, cell: GridCell, passable: &PassableSet) -> bool {
        self.tile_at(cell).is_some_and(|t| passable.contains(t))
    }

    /// Walkable 4-connected neighbours.
    pub fn neighbors(&self, cell: GridCell, passable: &PassableSet) -> Vec<GridCell> {
        cell.orthogonal()
            .into_iter()
            .filter(|n| self.is_walkable(*n, passable))
            .collect()
    }

    /// Every cell holding `tile`, in reading order.
    pub fn cells_of(&self, tile: Tile) -> Vec<GridCell> {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .filter(move |(_, t)| **t == tile)
                    .map(move |(c, _)| GridCell::new(r as i32, c as i32))
            })
            .collect()
    }

    pub fn center(&self) -> GridCell {
        GridCell::new((self.height() / 2) as i32, (self.width / 2) as i32)
    }

    /// First walkable cell found by scanning square rings outward from the
    /// grid centre. Falls back to the centre itself.
    pub fn spawn_cell_near_center(&self, passable: &PassableSet) -> GridCell {
        let center = self.center();
        let radius = self.height().max(self.width) as i32;
        for d in 0..radius {
            for dr in -d..=d {
                for dc in -d..=d {
                    if dr.abs() != d && dc.abs() != d {
                        continue;
                    }
                    let cell = center.offset(dr, dc);
                    if self.is_walkable(cell, passable) {
                        return cell;
                    }
                }
            }
        }
        center
    }

    /// Closest walkable cell to `cell` by breadth-first search through the
    /// grid rectangle, visiting at most `max_visits` cells.
    pub fn nearest_walkable(
        &self,
        cell: GridCell,
        passable: &PassableSet,
        max_visits: usize,
    ) -> Option<GridCell> {
        if self.is_empty() {
            return None;
        }
        let start = GridCell::new(
            cell.row.clamp(0, self.height() as i32 - 1),
            cell.col.clamp(0, self.width as i32 - 1),
        );
        bfs_reach(start, |c: &GridCell| {
            c.orthogonal()
                .into_iter()
                .filter(|n| self.in_bounds(*n))
                .collect::<Vec<_>>()
        })
        .take(max_visits)
        .find(|c| self.is_walkable(*c, passable))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
