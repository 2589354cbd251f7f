// animation/fade.rs - Full-screen fade overlay state

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use super::{Callback, Color, Curve, Result, Scheduler, Tween};

/// Overlay colour plus an alpha driven by one reusable tween.
/// Input is blocked while a fade runs.
pub struct FadeOverlay {
    color: Color,
    alpha: Rc<Cell<f32>>,
    blocking: Rc<Cell<bool>>,
    tween: Tween,
}

impl FadeOverlay {
    pub fn new(scheduler: &Scheduler, color: Color) -> Self {
        let alpha = Rc::new(Cell::new(0.0f32));
        Self {
            color,
            tween: Tween::bound(scheduler, alpha.clone(), Curve::Quadratic),
            alpha,
            blocking: Rc::new(Cell::new(false)),
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha.get()
    }

    /// Overlay colour with the current alpha applied
    pub fn color(&self) -> Color {
        self.color.with_alpha(self.alpha.get())
    }

    pub fn blocks_input(&self) -> bool {
        self.blocking.get()
    }

    /// Fade to `target` alpha, interrupting any fade in progress.
    /// `on_complete` runs when the target is reached, immediately if it already is.
    pub fn fade_to(&mut self, target: f32, duration: Duration, on_complete: Option<Callback>) -> Result<()> {
        let color = self.color;
        self.fade(color, target, duration, false, on_complete)
    }

    /// Switch the overlay to `color` and fade to `target` alpha.
    /// With `block_on_complete` set, input stays blocked after the fade finishes
    /// until the next fade or [`FadeOverlay::clear`].
    pub fn fade(
        &mut self,
        color: Color,
        target: f32,
        duration: Duration,
        block_on_complete: bool,
        on_complete: Option<Callback>,
    ) -> Result<()> {
        let target = target.clamp(0.0, 1.0);
        self.tween.stop();
        self.color = color;

        if self.alpha.get() == target {
            self.blocking.set(block_on_complete);
            if let Some(callback) = on_complete {
                callback();
            }
            return Ok(());
        }

        self.blocking.set(true);
        let blocking = self.blocking.clone();
        self.tween.start_with_callback(target, duration, move || {
            blocking.set(block_on_complete);
            if let Some(callback) = on_complete {
                callback();
            }
        })
    }

    pub fn fade_out(&mut self, duration: Duration, on_complete: Option<Callback>) -> Result<()> {
        self.fade_to(1.0, duration, on_complete)
    }

    pub fn fade_in(&mut self, duration: Duration, on_complete: Option<Callback>) -> Result<()> {
        self.fade_to(0.0, duration, on_complete)
    }

    /// Drop any fade and clear the overlay
    pub fn clear(&mut self) {
        self.tween.stop();
        self.alpha.set(0.0);
        self.blocking.set(false);
    }
}
