// animation/lighting_animator.rs - Checkerboard light layout and staggered activation

use std::time::Duration;

use log::debug;
use serde::Serialize;

use super::{Color, Step, Task};
use crate::maze::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LightKind {
    Entry,
    Goal,
    Path,
}

/// One point light attached to a cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellLight {
    pub row: u32,
    pub col: u32,
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
    pub range: f32,
}

impl CellLight {
    fn new(row: u32, col: u32, kind: LightKind, wall_height: f32) -> Self {
        let (color, intensity, range) = match kind {
            LightKind::Entry => (Color::BLUE, 2.0, wall_height * 2.0),
            LightKind::Goal => (Color::GREEN, 2.0, wall_height * 2.0),
            LightKind::Path => (Color::YELLOW, 1.0, wall_height),
        };
        Self {
            row,
            col,
            kind,
            color,
            intensity,
            range,
        }
    }
}

/// Lights in activation order (row-major).
///
/// Each row opens with `place = row % 2 == 0`. An ordinary cell reached while
/// `place` is false is skipped and flips `place` on. Every placed light, the
/// entry and goal cells included, turns `place` off.
pub fn plan_lights(grid: &Grid, wall_height: f32) -> Vec<CellLight> {
    let start = grid.start_cell();
    let goal = grid.goal_cell();
    let mut lights = Vec::new();

    for row in 0..grid.rows() {
        let mut place = row % 2 == 0;
        for col in 0..grid.cols() {
            let kind = if (row, col) == start {
                LightKind::Entry
            } else if (row, col) == goal {
                LightKind::Goal
            } else {
                LightKind::Path
            };

            if !place && kind == LightKind::Path {
                place = true;
                continue;
            }

            lights.push(CellLight::new(row, col, kind, wall_height));
            place = false;
        }
    }

    lights
}

/// Task that hands lights to `place` one at a time, waiting `stagger` after each,
/// then calls `on_finished`.
pub struct LightActivation<P, F>
where
    P: FnMut(&CellLight),
    F: FnOnce(),
{
    lights: Vec<CellLight>,
    next: usize,
    stagger: Duration,
    place: P,
    on_finished: Option<F>,
}

impl<P, F> LightActivation<P, F>
where
    P: FnMut(&CellLight),
    F: FnOnce(),
{
    pub fn new(lights: Vec<CellLight>, stagger: Duration, place: P, on_finished: F) -> Self {
        Self {
            lights,
            next: 0,
            stagger,
            place,
            on_finished: Some(on_finished),
        }
    }
}

impl<P, F> Task for LightActivation<P, F>
where
    P: FnMut(&CellLight),
    F: FnOnce(),
{
    fn step(&mut self, _dt: Duration) -> Step {
        match self.lights.get(self.next) {
            Some(light) => {
                (self.place)(light);
                self.next += 1;
                Step::WaitFor(self.stagger)
            }
            None => {
                debug!("Activated {} lights", self.lights.len());
                if let Some(done) = self.on_finished.take() {
                    done();
                }
                Step::Done
            }
        }
    }
}
