// animation/camera_animator.rs - Camera rig with interruptible framing moves

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use log::{debug, error};
use serde::{Deserialize, Serialize};

use super::{bind, Bounds, Curve, Scheduler, Tween, Vec3};

/// Camera position plus unit look direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub forward: Vec3,
}

impl CameraPose {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self {
            position,
            forward: forward.normalize(),
        }
    }
}

/// Camera state shared between the rig and its in-flight move
struct RigState {
    position: Cell<Vec3>,
    forward: Cell<Vec3>,
}

impl RigState {
    fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position.get(),
            forward: self.forward.get(),
        }
    }

    fn apply(&self, pose: CameraPose) {
        self.position.set(pose.position);
        self.forward.set(pose.forward);
    }
}

/// Camera rig. Cloning yields another handle to the same camera.
///
/// A single progress tween (linear, 0 to 1) drives every move: position is
/// lerped and the look direction slerped from the pose at move start. A new
/// move cancels the one in flight.
#[derive(Clone)]
pub struct CameraRig {
    state: Rc<RigState>,
    mover: Rc<RefCell<Tween>>,
    baseline: CameraPose,
}

impl CameraRig {
    pub fn new(scheduler: &Scheduler, baseline: CameraPose) -> Self {
        let state = Rc::new(RigState {
            position: Cell::new(baseline.position),
            forward: Cell::new(baseline.forward),
        });

        Self {
            state,
            mover: Rc::new(RefCell::new(Tween::new(scheduler).with_curve(Curve::Linear))),
            baseline,
        }
    }

    pub fn pose(&self) -> CameraPose {
        self.state.pose()
    }

    pub fn position(&self) -> Vec3 {
        self.state.position.get()
    }

    pub fn forward(&self) -> Vec3 {
        self.state.forward.get()
    }

    pub fn baseline(&self) -> CameraPose {
        self.baseline
    }

    pub fn is_moving(&self) -> bool {
        self.mover.borrow().is_running()
    }

    /// Back the camera off along its current bearing until `bounds` fits in view.
    /// Zero-size bounds are ignored.
    pub fn fit_bounds_in_view(&self, bounds: Bounds, duration: Duration) {
        if bounds.is_empty() {
            return;
        }

        let max_size = bounds.size.max_element();
        let mut direction = (self.position() - bounds.center).normalize();
        if direction == Vec3::zero() {
            direction = -self.forward();
        }

        let destination = CameraPose {
            position: bounds.center + direction * max_size,
            forward: -direction,
        };
        debug!(
            "Framing bounds centred at {:?} from {:?}",
            bounds.center, destination.position
        );
        self.move_to(destination, duration);
    }

    /// Move without changing the look direction
    pub fn move_to_position(&self, position: Vec3, duration: Duration) {
        let target = CameraPose {
            position,
            forward: self.forward(),
        };
        self.move_to(target, duration);
    }

    /// Cancel any move and restore the baseline pose
    pub fn reset(&self) {
        self.mover.borrow_mut().stop();
        self.state.apply(self.baseline);
    }

    fn move_to(&self, target: CameraPose, duration: Duration) {
        let mut mover = self.mover.borrow_mut();
        mover.stop();

        if duration.is_zero() {
            self.state.apply(target);
            return;
        }

        let from = self.pose();
        let progress = Rc::new(Cell::new(0.0f32));
        let state = self.state.clone();
        let reader = progress.clone();

        let driver = bind(
            move || reader.get(),
            move |t| {
                progress.set(t);
                state.position.set(from.position.lerp(target.position, t));
                state.forward.set(from.forward.slerp(target.forward, t));
            },
        );

        // The driver always runs 0 -> 1, so starting cannot be a no-op
        if let Err(err) = mover.start_bound(driver, 1.0, duration, Curve::Linear, None) {
            error!("Camera move could not start: {err}");
        }
    }
}
