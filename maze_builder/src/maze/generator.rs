// maze/generator.rs - Randomized backtracker with an explicit frame stack

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{Direction, Grid};
use crate::error_handling::{validate_dimensions, Result};

/// One suspended visit: the cell, its shuffled directions and how many were tried
struct Frame {
    index: usize,
    directions: [Direction; 4],
    next: usize,
}

/// Seeded maze generator. Successive calls draw from the same random stream.
pub struct MazeGenerator {
    rng: StdRng,
}

impl MazeGenerator {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn enter(&mut self, index: usize) -> Frame {
        let mut directions = Direction::ALL;
        directions.shuffle(&mut self.rng);
        Frame {
            index,
            directions,
            next: 0,
        }
    }

    /// Carve a perfect maze starting from the top-left cell.
    ///
    /// Every carve removes the shared wall on both cells, so the grid never
    /// needs a symmetry fix-up afterwards.
    pub fn generate(&mut self, rows: u32, cols: u32) -> Result<Grid> {
        validate_dimensions(rows, cols)?;
        let mut grid = Grid::new(rows, cols)?;

        let mut stack: Vec<Frame> = Vec::with_capacity(grid.len());
        grid.cell_at_mut(0).visited = true;
        stack.push(self.enter(0));

        let mut carved = 0usize;
        while let Some(frame) = stack.last_mut() {
            if frame.next == frame.directions.len() {
                stack.pop();
                continue;
            }

            let direction = frame.directions[frame.next];
            frame.next += 1;
            let (row, col) = grid.position(frame.index);

            let Some((nr, nc)) = grid.neighbor(row, col, direction) else {
                continue;
            };
            let neighbor = grid.index(nr, nc);
            if grid.cells()[neighbor].visited {
                continue;
            }

            grid.carve(row, col, direction);
            grid.cell_at_mut(neighbor).visited = true;
            carved += 1;

            let next = self.enter(neighbor);
            stack.push(next);
        }

        debug!("Carved {rows}x{cols} maze with {carved} passages");
        Ok(grid)
    }
}

/// Generate a maze; identical arguments always give an identical grid
pub fn generate(rows: u32, cols: u32, seed: u64) -> Result<Grid> {
    MazeGenerator::from_seed(seed).generate(rows, cols)
}
