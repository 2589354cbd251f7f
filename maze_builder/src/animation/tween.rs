// animation/tween.rs - Single-value tweens hosted on the cooperative scheduler

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use log::{error, trace};

use super::{AnimationError, Result, Scheduler, Step, Task, TaskHandle};

// ============================================================================
// EASING CURVES
// ============================================================================

/// Tween curves. Output is not required to stay inside [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Curve {
    Linear,
    #[default]
    Quadratic,
    EaseOutBack,
}

impl Curve {
    /// Map normalized elapsed time to an output fraction
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Curve::Linear => t,
            Curve::Quadratic => t * t,
            Curve::EaseOutBack => {
                let c1 = 1.70158;
                let c2 = c1 + 1.0;
                let u = t - 1.0;
                1.0 + c2 * u * u * u + c1 * u * u
            }
        }
    }
}

// ============================================================================
// TARGETS
// ============================================================================

/// Read/write handle to the scalar a tween drives
pub trait TweenTarget {
    fn get(&self) -> f32;
    fn set(&self, value: f32);
}

impl TweenTarget for Cell<f32> {
    #[inline]
    fn get(&self) -> f32 {
        Cell::get(self)
    }

    #[inline]
    fn set(&self, value: f32) {
        Cell::set(self, value)
    }
}

impl<T: TweenTarget + ?Sized> TweenTarget for Rc<T> {
    #[inline]
    fn get(&self) -> f32 {
        (**self).get()
    }

    #[inline]
    fn set(&self, value: f32) {
        (**self).set(value)
    }
}

/// Getter/setter pair, for targets that fan a value out to other state
pub struct Binding<G, S> {
    getter: G,
    setter: S,
}

impl<G, S> TweenTarget for Binding<G, S>
where
    G: Fn() -> f32,
    S: Fn(f32),
{
    #[inline]
    fn get(&self) -> f32 {
        (self.getter)()
    }

    #[inline]
    fn set(&self, value: f32) {
        (self.setter)(value)
    }
}

pub fn bind<G, S>(getter: G, setter: S) -> Binding<G, S>
where
    G: Fn() -> f32,
    S: Fn(f32),
{
    Binding { getter, setter }
}

// ============================================================================
// TWEEN
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

pub type Callback = Box<dyn FnOnce()>;

/// One in-flight interpolation, owned by the scheduler
struct TweenRun {
    target: Rc<dyn TweenTarget>,
    initial: f32,
    delta: f32,
    end: f32,
    duration: Duration,
    elapsed: Duration,
    curve: Curve,
    on_complete: Option<Callback>,
    state: Rc<Cell<TweenState>>,
}

impl Task for TweenRun {
    fn step(&mut self, dt: Duration) -> Step {
        self.elapsed += dt;

        if self.elapsed >= self.duration {
            // initial + delta can round away from end in f32
            self.target.set(self.end);
            self.state.set(TweenState::Completed);
            if let Some(callback) = self.on_complete.take() {
                callback();
            }
            return Step::Done;
        }

        let t = (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0);
        self.target
            .set(self.initial + self.delta * self.curve.apply(t));
        Step::Continue
    }
}

/// Reusable float tween. Runs on unscaled tick time.
///
/// Starting again while a previous run is active cancels that run first.
/// Dropping a `Tween` does not stop its run; call [`Tween::stop`] for that.
pub struct Tween {
    scheduler: Scheduler,
    target: Option<Rc<dyn TweenTarget>>,
    curve: Curve,
    task: Option<TaskHandle>,
    state: Rc<Cell<TweenState>>,
}

impl Tween {
    /// Tween with no target yet; supply one with [`Tween::start_bound`]
    pub fn new(scheduler: &Scheduler) -> Self {
        Self {
            scheduler: scheduler.clone(),
            target: None,
            curve: Curve::default(),
            task: None,
            state: Rc::new(Cell::new(TweenState::Idle)),
        }
    }

    pub fn bound<T: TweenTarget + 'static>(scheduler: &Scheduler, target: T, curve: Curve) -> Self {
        let mut tween = Self::new(scheduler);
        tween.target = Some(Rc::new(target));
        tween.curve = curve;
        tween
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }

    pub fn set_target<T: TweenTarget + 'static>(&mut self, target: T) {
        self.target = Some(Rc::new(target));
    }

    pub fn state(&self) -> TweenState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.state.get() == TweenState::Running
    }

    /// Tween the bound target to `end` over `duration`
    pub fn start(&mut self, end: f32, duration: Duration) -> Result<()> {
        self.launch(end, duration, None)
    }

    pub fn start_with_callback<F>(&mut self, end: f32, duration: Duration, on_complete: F) -> Result<()>
    where
        F: FnOnce() + 'static,
    {
        self.launch(end, duration, Some(Box::new(on_complete)))
    }

    /// Rebind target and curve, then start
    pub fn start_bound<T: TweenTarget + 'static>(
        &mut self,
        target: T,
        end: f32,
        duration: Duration,
        curve: Curve,
        on_complete: Option<Callback>,
    ) -> Result<()> {
        self.set_target(target);
        self.curve = curve;
        self.launch(end, duration, on_complete)
    }

    fn launch(&mut self, end: f32, duration: Duration, on_complete: Option<Callback>) -> Result<()> {
        let Some(target) = self.target.clone() else {
            error!("Tween started without a target; nothing to animate");
            return Err(AnimationError::MissingTarget);
        };

        if !end.is_finite() {
            return Err(AnimationError::InvalidParameters(format!(
                "tween end value must be finite, got {end}"
            )));
        }

        self.stop();
        let state = Rc::new(Cell::new(TweenState::Idle));
        self.state = state.clone();

        let initial = target.get();
        let delta = end - initial;

        // Already at the end value: nothing runs and the callback is not invoked
        if delta == 0.0 {
            trace!("Tween to {end} skipped, value already there");
            return Ok(());
        }

        if duration.is_zero() {
            target.set(end);
            state.set(TweenState::Completed);
            if let Some(callback) = on_complete {
                callback();
            }
            return Ok(());
        }

        state.set(TweenState::Running);
        let run = TweenRun {
            target,
            initial,
            delta,
            end,
            duration,
            elapsed: Duration::ZERO,
            curve: self.curve,
            on_complete,
            state,
        };
        self.task = Some(self.scheduler.schedule_labeled("tween", run));
        Ok(())
    }

    /// Cancel the active run. The value stays as last written and the
    /// completion callback never fires.
    pub fn stop(&mut self) {
        if let Some(handle) = self.task.take() {
            if self.scheduler.cancel(handle) && self.state.get() == TweenState::Running {
                self.state.set(TweenState::Cancelled);
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
