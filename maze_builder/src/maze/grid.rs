// maze/grid.rs - Cell/wall grid for rectangular perfect mazes

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error_handling::{validate_dimensions, Result};

/// Clockwise cardinal directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    #[inline]
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// (row, col) step; row 0 is the top of the maze
    #[inline]
    const fn offset(self) -> (i64, i64) {
        match self {
            Direction::North => (-1, 0),
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
        }
    }
}

/// One maze position with four independent walls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
    #[serde(skip)]
    pub visited: bool,
}

impl Cell {
    pub const fn new(row: u32, col: u32) -> Self {
        Self {
            row,
            col,
            north: true,
            south: true,
            east: true,
            west: true,
            visited: false,
        }
    }

    #[inline]
    pub fn has_wall(&self, direction: Direction) -> bool {
        match direction {
            Direction::North => self.north,
            Direction::East => self.east,
            Direction::South => self.south,
            Direction::West => self.west,
        }
    }

    #[inline]
    fn set_wall(&mut self, direction: Direction, present: bool) {
        match direction {
            Direction::North => self.north = present,
            Direction::East => self.east = present,
            Direction::South => self.south = present,
            Direction::West => self.west = present,
        }
    }

    pub fn wall_count(&self) -> usize {
        Direction::ALL.iter().filter(|d| self.has_wall(**d)).count()
    }
}

/// Row-major arena of cells. `cells[row * cols + col]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grid {
    rows: u32,
    cols: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Fully walled, unvisited grid
    pub fn new(rows: u32, cols: u32) -> Result<Self> {
        validate_dimensions(rows, cols)?;

        let mut cells = Vec::with_capacity(rows as usize * cols as usize);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(Cell::new(row, col));
            }
        }

        Ok(Self { rows, cols, cells })
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub(crate) fn index(&self, row: u32, col: u32) -> usize {
        row as usize * self.cols as usize + col as usize
    }

    #[inline]
    pub(crate) fn position(&self, index: usize) -> (u32, u32) {
        let cell = &self.cells[index];
        (cell.row, cell.col)
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        if row < self.rows && col < self.cols {
            Some(&self.cells[self.index(row, col)])
        } else {
            None
        }
    }

    pub(crate) fn cell_at_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    /// Neighbouring position in `direction`, if it lies inside the grid
    pub fn neighbor(&self, row: u32, col: u32, direction: Direction) -> Option<(u32, u32)> {
        let (dr, dc) = direction.offset();
        let r = i64::from(row) + dr;
        let c = i64::from(col) + dc;
        if r < 0 || c < 0 || r >= i64::from(self.rows) || c >= i64::from(self.cols) {
            return None;
        }
        Some((r as u32, c as u32))
    }

    /// True when a neighbour exists in `direction` and the shared wall is absent
    pub fn is_open(&self, row: u32, col: u32, direction: Direction) -> bool {
        match (self.cell(row, col), self.neighbor(row, col, direction)) {
            (Some(cell), Some(_)) => !cell.has_wall(direction),
            _ => false,
        }
    }

    /// Remove the wall between a cell and its neighbour on both sides.
    /// Returns false (and changes nothing) when there is no neighbour.
    pub(crate) fn carve(&mut self, row: u32, col: u32, direction: Direction) -> bool {
        let Some((nr, nc)) = self.neighbor(row, col, direction) else {
            return false;
        };
        let here = self.index(row, col);
        let there = self.index(nr, nc);
        self.cells[here].set_wall(direction, false);
        self.cells[there].set_wall(direction.opposite(), false);
        true
    }

    /// Open edges, each reported once (east and south of every cell)
    pub fn open_edges(&self) -> impl Iterator<Item = ((u32, u32), (u32, u32))> + '_ {
        self.cells.iter().flat_map(move |cell| {
            [Direction::East, Direction::South]
                .into_iter()
                .filter(move |d| self.is_open(cell.row, cell.col, *d))
                .filter_map(move |d| {
                    self.neighbor(cell.row, cell.col, d)
                        .map(|n| ((cell.row, cell.col), n))
                })
        })
    }

    pub fn open_edge_count(&self) -> usize {
        self.open_edges().count()
    }

    /// Number of cells reachable from `start` through open edges
    pub fn reachable_count(&self, start: (u32, u32)) -> usize {
        if self.cell(start.0, start.1).is_none() {
            return 0;
        }

        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::new();
        seen[self.index(start.0, start.1)] = true;
        queue.push_back(start);
        let mut count = 0;

        while let Some((row, col)) = queue.pop_front() {
            count += 1;
            for direction in Direction::ALL {
                if !self.is_open(row, col, direction) {
                    continue;
                }
                if let Some((nr, nc)) = self.neighbor(row, col, direction) {
                    let idx = self.index(nr, nc);
                    if !seen[idx] {
                        seen[idx] = true;
                        queue.push_back((nr, nc));
                    }
                }
            }
        }

        count
    }

    /// Every wall flag agrees with its neighbour's mirrored flag
    pub fn walls_symmetric(&self) -> bool {
        self.cells.iter().all(|cell| {
            Direction::ALL.iter().all(|&d| {
                match self.neighbor(cell.row, cell.col, d) {
                    Some((nr, nc)) => {
                        let other = &self.cells[self.index(nr, nc)];
                        cell.has_wall(d) == other.has_wall(d.opposite())
                    }
                    None => true,
                }
            })
        })
    }

    /// Spanning tree check: symmetric walls, `len - 1` open edges, fully connected
    pub fn is_perfect(&self) -> bool {
        self.walls_symmetric()
            && self.open_edge_count() == self.cells.len() - 1
            && self.reachable_count((0, 0)) == self.cells.len()
    }

    /// Entry cell: bottom-left corner
    #[inline]
    pub fn start_cell(&self) -> (u32, u32) {
        (self.rows - 1, 0)
    }

    /// Goal cell: top-right corner
    #[inline]
    pub fn goal_cell(&self) -> (u32, u32) {
        (0, self.cols - 1)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.start_cell();
        let goal = self.goal_cell();

        let mut top = String::from("+");
        for col in 0..self.cols {
            top.push_str(if self.cells[self.index(0, col)].north { "---+" } else { "   +" });
        }
        writeln!(f, "{top}")?;

        for row in 0..self.rows {
            let mut body = String::new();
            let mut floor = String::from("+");
            body.push(if self.cells[self.index(row, 0)].west { '|' } else { ' ' });

            for col in 0..self.cols {
                let cell = &self.cells[self.index(row, col)];
                let label = if (row, col) == start {
                    " S "
                } else if (row, col) == goal {
                    " G "
                } else {
                    "   "
                };
                body.push_str(label);
                body.push(if cell.east { '|' } else { ' ' });
                floor.push_str(if cell.south { "---+" } else { "   +" });
            }

            writeln!(f, "{body}")?;
            writeln!(f, "{floor}")?;
        }

        Ok(())
    }
}
