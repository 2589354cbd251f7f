// animation/orchestrator.rs - Phase sequencing for maze construction
//
// One scheduled construction task walks the phases in order. Each phase starts
// its own scheduled work (tweens, the staggered light task, camera moves,
// timed waits) and the task only moves on once that work reports back.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

use log::{debug, error, info, warn};
use serde::Serialize;

use super::{
    bind, plan_lights, CameraRig, CellLight, Curve, LightActivation, Scheduler, Step, Task,
    TaskHandle, Tween, Vec3,
};
use crate::config::{BuildConfig, MazeSettings};
use crate::error_handling::{validate_dimensions, MazeError, Result};
use crate::events::{EventBus, MazeEvent, Subscription};
use crate::maze::{generate, Grid};
use crate::scene::MazeScene;

/// Construction phases, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    Idle,
    ScalingFloor,
    CarvingMaze,
    RaisingWalls,
    ActivatingLights,
    FramingGoal,
    ReturningToOverview,
    SpawningEntry,
    Done,
}

/// State shared by the sequencer handle and its construction task
struct Shared {
    scheduler: Scheduler,
    config: BuildConfig,
    scene: Rc<RefCell<MazeScene>>,
    camera: CameraRig,
    events: EventBus<MazeEvent>,
    phase: Cell<Phase>,
    grid: RefCell<Option<Rc<Grid>>>,
    slot: Cell<Option<TaskHandle>>,
    // Bumped on restart so a task cancelled mid-step stops touching state
    epoch: Cell<u64>,
    goal_entered: Cell<bool>,
}

impl Shared {
    fn set_phase(&self, phase: Phase) {
        if self.phase.replace(phase) != phase {
            debug!("Construction phase -> {phase:?}");
            self.events.emit(&MazeEvent::PhaseChanged(phase));
        }
    }

    fn in_flight(&self) -> bool {
        self.slot
            .get()
            .is_some_and(|handle| self.scheduler.is_active(handle))
    }

    fn goal_block_bounds(&self) -> Option<super::Bounds> {
        let grid = self.grid.borrow();
        let (row, col) = grid.as_ref()?.goal_cell();
        self.scene.borrow().block(row, col).map(|block| block.bounds())
    }
}

// ============================================================================
// CONSTRUCTION TASK
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Begin,
    AwaitFloor,
    Carve,
    RaiseWalls,
    AwaitWalls,
    Lights,
    AwaitLights,
    Reveal,
    FocusGoal,
    AnnounceFocus,
    ReturnToOverview,
    SpawnEntry,
    Finish,
}

enum Advance {
    /// Run the next stage in the same tick
    Proceed,
    Yield(Step),
}

struct Construction {
    shared: Rc<Shared>,
    epoch: u64,
    rows: u32,
    cols: u32,
    seed: u64,
    stage: Stage,
    tween: Tween,
    lights: Option<TaskHandle>,
    signal: Rc<Cell<bool>>,
    overview: Vec3,
}

impl Construction {
    fn new(shared: Rc<Shared>, rows: u32, cols: u32, seed: u64) -> Self {
        let tween = Tween::new(&shared.scheduler);
        Self {
            epoch: shared.epoch.get(),
            shared,
            rows,
            cols,
            seed,
            stage: Stage::Begin,
            tween,
            lights: None,
            signal: Rc::new(Cell::new(false)),
            overview: Vec3::zero(),
        }
    }

    fn stale(&self) -> bool {
        self.shared.epoch.get() != self.epoch
    }

    /// Fresh completion flag for the next piece of phase work
    fn arm(&self) -> Rc<Cell<bool>> {
        self.signal.set(false);
        self.signal.clone()
    }

    fn enter(&self, phase: Phase) -> bool {
        self.shared.set_phase(phase);
        !self.stale()
    }

    fn emit(&self, event: MazeEvent) -> bool {
        self.shared.events.emit(&event);
        !self.stale()
    }

    fn finish_early(&self) -> Advance {
        Advance::Yield(Step::Done)
    }

    fn advance(&mut self) -> Advance {
        let shared = self.shared.clone();
        let config = &shared.config;

        match self.stage {
            Stage::Begin => {
                if !self.enter(Phase::ScalingFloor) || !self.emit(MazeEvent::GenerationStarted) {
                    return self.finish_early();
                }

                let bounds = {
                    let mut scene = shared.scene.borrow_mut();
                    scene.prepare_floor(self.rows, self.cols, config.block_size);
                    scene.floor_bounds()
                };
                shared.camera.fit_bounds_in_view(bounds, config.camera_move_time());

                let progress = Rc::new(Cell::new(0.0f32));
                let reader = progress.clone();
                let scene = shared.scene.clone();
                let rotations = config.floor_rotations;
                let driver = bind(
                    move || reader.get(),
                    move |m| {
                        progress.set(m);
                        scene.borrow_mut().set_floor_progress(m, rotations);
                    },
                );
                self.start_tween(driver, config.floor_scale_time());
                self.stage = Stage::AwaitFloor;
                Advance::Yield(Step::Continue)
            }

            Stage::AwaitFloor => {
                if !self.signal.get() {
                    return Advance::Yield(Step::Continue);
                }
                shared.scene.borrow_mut().snap_floor();
                self.stage = Stage::Carve;
                Advance::Proceed
            }

            Stage::Carve => {
                if !self.enter(Phase::CarvingMaze) {
                    return self.finish_early();
                }
                let grid = match generate(self.rows, self.cols, self.seed) {
                    Ok(grid) => Rc::new(grid),
                    Err(err) => {
                        error!("Maze generation failed: {err}");
                        shared.set_phase(Phase::Idle);
                        return self.finish_early();
                    }
                };
                shared.scene.borrow_mut().place_blocks(&grid, config.block_size);
                *shared.grid.borrow_mut() = Some(grid);
                self.stage = Stage::RaiseWalls;
                Advance::Proceed
            }

            Stage::RaiseWalls => {
                if !self.enter(Phase::RaisingWalls) {
                    return self.finish_early();
                }

                // One tween for every block, so all walls share a height each tick
                let progress = Rc::new(Cell::new(0.0f32));
                let reader = progress.clone();
                let scene = shared.scene.clone();
                let (block_size, wall_height) = (config.block_size, config.wall_height);
                let driver = bind(
                    move || reader.get(),
                    move |m| {
                        progress.set(m);
                        scene
                            .borrow_mut()
                            .set_wall_progress(m, block_size, wall_height);
                    },
                );
                self.start_tween(driver, config.wall_scale_time());
                self.stage = Stage::AwaitWalls;
                Advance::Yield(Step::Continue)
            }

            Stage::AwaitWalls => {
                if !self.signal.get() {
                    return Advance::Yield(Step::Continue);
                }
                self.stage = Stage::Lights;
                Advance::Proceed
            }

            Stage::Lights => {
                if !self.enter(Phase::ActivatingLights) {
                    return self.finish_early();
                }
                let plan = match shared.grid.borrow().as_ref() {
                    Some(grid) => plan_lights(grid, config.wall_height),
                    None => Vec::new(),
                };

                let finished = self.arm();
                let scene = shared.scene.clone();
                let activation = LightActivation::new(
                    plan,
                    config.light_stagger(),
                    move |light: &CellLight| scene.borrow_mut().add_light(*light),
                    move || finished.set(true),
                );
                shared
                    .scheduler
                    .replace_labeled(&mut self.lights, "lights", activation);
                self.stage = Stage::AwaitLights;
                Advance::Yield(Step::Continue)
            }

            Stage::AwaitLights => {
                if !self.signal.get() {
                    return Advance::Yield(Step::Continue);
                }
                self.stage = Stage::Reveal;
                Advance::Proceed
            }

            Stage::Reveal => {
                if !self.enter(Phase::FramingGoal) {
                    return self.finish_early();
                }
                self.stage = Stage::FocusGoal;
                Advance::Yield(Step::WaitFor(config.goal_reveal_delay()))
            }

            Stage::FocusGoal => {
                self.overview = shared.camera.position();
                if let Some(bounds) = shared.goal_block_bounds() {
                    shared
                        .camera
                        .fit_bounds_in_view(bounds, config.camera_move_time());
                }
                self.stage = Stage::AnnounceFocus;
                Advance::Yield(Step::WaitFor(config.camera_move_time()))
            }

            Stage::AnnounceFocus => {
                if !self.emit(MazeEvent::FocusedOnGoal) {
                    return self.finish_early();
                }
                self.stage = Stage::ReturnToOverview;
                Advance::Yield(Step::WaitFor(config.goal_hold()))
            }

            Stage::ReturnToOverview => {
                if !self.enter(Phase::ReturningToOverview) {
                    return self.finish_early();
                }
                shared
                    .camera
                    .move_to_position(self.overview, config.camera_move_time());
                self.stage = Stage::SpawnEntry;
                Advance::Yield(Step::WaitFor(config.camera_move_time()))
            }

            Stage::SpawnEntry => {
                if !self.enter(Phase::SpawningEntry) {
                    return self.finish_early();
                }
                let start = shared.grid.borrow().as_ref().map(|grid| grid.start_cell());
                {
                    let mut scene = shared.scene.borrow_mut();
                    let entry = start
                        .and_then(|(row, col)| scene.block(row, col))
                        .map(|block| block.position + Vec3::up() * (config.wall_height * 0.5));
                    if let Some(point) = entry {
                        scene.set_entry_point(point);
                    }
                }
                self.stage = Stage::Finish;
                Advance::Yield(Step::WaitFor(config.spawn_settle()))
            }

            Stage::Finish => {
                if !self.enter(Phase::Done) {
                    return self.finish_early();
                }
                let grid = shared.grid.borrow().clone();
                if let Some(grid) = grid {
                    info!("Maze {}x{} construction complete", grid.rows(), grid.cols());
                    self.emit(MazeEvent::GenerationCompleted(grid));
                }
                Advance::Yield(Step::Done)
            }
        }
    }

    fn start_tween<T: super::TweenTarget + 'static>(&mut self, driver: T, duration: Duration) {
        let finished = self.arm();
        let result = self.tween.start_bound(
            driver,
            1.0,
            duration,
            Curve::EaseOutBack,
            Some(Box::new(move || finished.set(true))),
        );
        if let Err(err) = result {
            error!("Construction tween failed to start: {err}");
            self.signal.set(true);
        }
    }
}

impl Task for Construction {
    fn step(&mut self, _dt: Duration) -> Step {
        loop {
            if self.stale() {
                return Step::Done;
            }
            match self.advance() {
                Advance::Proceed => continue,
                Advance::Yield(step) => return step,
            }
        }
    }
}

impl Drop for Construction {
    fn drop(&mut self) {
        self.tween.stop();
        self.shared.scheduler.stop(&mut self.lights);
    }
}

// ============================================================================
// SEQUENCER
// ============================================================================

/// Drives one maze construction at a time. Cloning yields another handle to
/// the same sequencer, so event handlers can hold one.
#[derive(Clone)]
pub struct ConstructionSequencer {
    shared: Rc<Shared>,
}

impl ConstructionSequencer {
    pub fn new(scheduler: &Scheduler, config: BuildConfig) -> Self {
        SequencerBuilder::new().config(config).build(scheduler)
    }

    pub fn builder() -> SequencerBuilder {
        SequencerBuilder::new()
    }

    /// Start building a `rows x cols` maze.
    ///
    /// Rejected while a construction runs or while a finished maze has not
    /// been restarted.
    pub fn request_generation(&self, rows: u32, cols: u32, seed: u64) -> Result<()> {
        validate_dimensions(rows, cols)?;

        if self.shared.in_flight() {
            warn!("Generation request {rows}x{cols} rejected: construction in flight");
            return Err(MazeError::GenerationInFlight);
        }
        if self.shared.phase.get() == Phase::Done {
            warn!("Generation request {rows}x{cols} rejected: restart first");
            return Err(MazeError::MazeAlreadyBuilt);
        }

        info!("Building {rows}x{cols} maze (seed {seed})");
        let task = Construction::new(self.shared.clone(), rows, cols, seed);
        let mut slot = self.shared.slot.take();
        self.shared
            .scheduler
            .replace_labeled(&mut slot, "construction", task);
        self.shared.slot.set(slot);
        Ok(())
    }

    pub fn request(&self, settings: MazeSettings) -> Result<()> {
        self.request_generation(settings.rows(), settings.cols(), settings.seed)
    }

    /// Report the player's cell. Entering the goal after construction frames
    /// it and emits `GoalCellEntered`, once per maze. Returns true on that entry.
    pub fn notify_cell_entered(&self, row: u32, col: u32) -> bool {
        let shared = &self.shared;
        if shared.phase.get() != Phase::Done || shared.goal_entered.get() {
            return false;
        }
        let is_goal = shared
            .grid
            .borrow()
            .as_ref()
            .is_some_and(|grid| grid.goal_cell() == (row, col));
        if !is_goal {
            return false;
        }

        shared.goal_entered.set(true);
        if let Some(bounds) = shared.goal_block_bounds() {
            shared
                .camera
                .fit_bounds_in_view(bounds, shared.config.camera_move_time());
        }
        info!("Goal cell ({row}, {col}) reached");
        shared.events.emit(&MazeEvent::GoalCellEntered);
        true
    }

    /// Abandon the current maze: stop construction and everything it drives,
    /// return the camera to baseline and clear the scene.
    pub fn restart(&self) {
        let shared = &self.shared;
        shared.epoch.set(shared.epoch.get() + 1);

        let mut slot = shared.slot.take();
        shared.scheduler.stop(&mut slot);

        shared.camera.reset();
        shared.scene.borrow_mut().clear();
        shared.grid.borrow_mut().take();
        shared.goal_entered.set(false);
        debug!("Construction restarted");
        shared.set_phase(Phase::Idle);
    }

    pub fn phase(&self) -> Phase {
        self.shared.phase.get()
    }

    pub fn is_in_flight(&self) -> bool {
        self.shared.in_flight()
    }

    pub fn grid(&self) -> Option<Rc<Grid>> {
        self.shared.grid.borrow().clone()
    }

    pub fn scene(&self) -> Ref<'_, MazeScene> {
        self.shared.scene.borrow()
    }

    pub fn camera(&self) -> &CameraRig {
        &self.shared.camera
    }

    pub fn config(&self) -> &BuildConfig {
        &self.shared.config
    }

    pub fn events(&self) -> &EventBus<MazeEvent> {
        &self.shared.events
    }

    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&MazeEvent) + 'static,
    {
        self.shared.events.subscribe(handler)
    }
}

/// Builder for sequencer wiring
#[derive(Default)]
pub struct SequencerBuilder {
    config: BuildConfig,
    events: Option<EventBus<MazeEvent>>,
    camera: Option<CameraRig>,
}

impl SequencerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    /// Publish on an existing bus instead of a private one
    pub fn events(mut self, events: EventBus<MazeEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn camera(mut self, camera: CameraRig) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn build(self, scheduler: &Scheduler) -> ConstructionSequencer {
        let camera = self
            .camera
            .unwrap_or_else(|| CameraRig::new(scheduler, self.config.camera));
        let scene = MazeScene::new(self.config.floor_center);

        ConstructionSequencer {
            shared: Rc::new(Shared {
                scheduler: scheduler.clone(),
                scene: Rc::new(RefCell::new(scene)),
                camera,
                events: self.events.unwrap_or_default(),
                phase: Cell::new(Phase::Idle),
                grid: RefCell::new(None),
                slot: Cell::new(None),
                epoch: Cell::new(0),
                goal_entered: Cell::new(false),
                config: self.config,
            }),
        }
    }
}
