//! End-to-end construction runs driven through the public API

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use maze_builder::animation::{Color, ConstructionSequencer, FadeOverlay, Phase, Scheduler, Vec3};
use maze_builder::config::BuildConfig;
use maze_builder::driver::run_to_completion;
use maze_builder::events::{EventBus, MazeEvent};
use maze_builder::{MazeError, Subscription};

const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, PartialEq)]
enum Seen {
    Started,
    Focused,
    Completed,
    GoalEntered,
}

fn record(sequencer: &ConstructionSequencer) -> (Rc<RefCell<Vec<Seen>>>, Subscription) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    let subscription = sequencer.subscribe(move |event| {
        let entry = match event {
            MazeEvent::GenerationStarted => Seen::Started,
            MazeEvent::FocusedOnGoal => Seen::Focused,
            MazeEvent::GenerationCompleted(_) => Seen::Completed,
            MazeEvent::GoalCellEntered => Seen::GoalEntered,
            MazeEvent::PhaseChanged(_) => return,
        };
        s.borrow_mut().push(entry);
    });
    (seen, subscription)
}

#[test]
fn lifecycle_events_fire_once_each_in_order() {
    let scheduler = Scheduler::new();
    let sequencer = ConstructionSequencer::new(&scheduler, BuildConfig::default());
    let (seen, _sub) = record(&sequencer);

    sequencer.request_generation(6, 5, 77).unwrap();
    assert!(run_to_completion(&scheduler, &sequencer, FRAME, 5_000).is_some());

    let grid = sequencer.grid().unwrap();
    let (row, col) = grid.goal_cell();
    assert!(sequencer.notify_cell_entered(row, col));
    assert!(!sequencer.notify_cell_entered(row, col));

    assert_eq!(
        *seen.borrow(),
        vec![Seen::Started, Seen::Focused, Seen::Completed, Seen::GoalEntered]
    );
}

#[test]
fn completed_event_carries_the_built_grid() {
    let scheduler = Scheduler::new();
    let sequencer = ConstructionSequencer::new(&scheduler, BuildConfig::default());
    let delivered = Rc::new(RefCell::new(None));
    let d = delivered.clone();
    let _sub = sequencer.subscribe(move |event| {
        if let MazeEvent::GenerationCompleted(grid) = event {
            *d.borrow_mut() = Some(grid.clone());
        }
    });

    sequencer.request_generation(4, 7, 3).unwrap();
    run_to_completion(&scheduler, &sequencer, FRAME, 5_000);

    let grid = delivered.borrow().clone().unwrap();
    assert!(Rc::ptr_eq(&grid, &sequencer.grid().unwrap()));
    assert_eq!((grid.rows(), grid.cols()), (4, 7));
    assert!(grid.is_perfect());
}

#[test]
fn walls_share_one_height_every_tick() {
    let scheduler = Scheduler::new();
    let sequencer = ConstructionSequencer::new(&scheduler, BuildConfig::default());
    sequencer.request_generation(6, 6, 12).unwrap();

    let mut heights_seen = 0;
    for _ in 0..5_000 {
        scheduler.tick(FRAME);
        if sequencer.phase() == Phase::Done {
            break;
        }
        let scene = sequencer.scene();
        if let Some(first) = scene.blocks().first() {
            assert!(scene.blocks().iter().all(|b| b.scale == first.scale));
            if sequencer.phase() == Phase::RaisingWalls {
                heights_seen += 1;
            }
        }
    }

    // A 1 s rise at 16 ms frames takes dozens of distinct heights
    assert!(heights_seen > 30);
    assert!(sequencer
        .scene()
        .blocks()
        .iter()
        .all(|b| b.scale == Vec3::new(10.0, 10.0, 10.0)));
}

#[test]
fn restart_in_every_phase_leaves_nothing_running() {
    let targets = [
        Phase::ScalingFloor,
        Phase::CarvingMaze,
        Phase::RaisingWalls,
        Phase::ActivatingLights,
        Phase::FramingGoal,
        Phase::ReturningToOverview,
        Phase::SpawningEntry,
    ];

    for target in targets {
        let scheduler = Scheduler::new();
        let sequencer = ConstructionSequencer::new(&scheduler, BuildConfig::default());
        let (seen, _sub) = record(&sequencer);

        // Restart from the phase notification itself; carving never spans a tick boundary
        let handle = sequencer.clone();
        let _restarter = sequencer.subscribe(move |event| {
            if matches!(event, MazeEvent::PhaseChanged(p) if *p == target) {
                handle.restart();
            }
        });

        sequencer.request_generation(5, 5, 21).unwrap();
        for _ in 0..5_000 {
            scheduler.tick(FRAME);
        }

        assert_eq!(sequencer.phase(), Phase::Idle, "restart during {target:?}");
        assert_eq!(scheduler.active_count(), 0, "restart during {target:?}");
        assert!(sequencer.grid().is_none());
        assert!(sequencer.scene().blocks().is_empty());
        assert!(sequencer.scene().lights().is_empty());
        assert_eq!(sequencer.camera().pose(), sequencer.camera().baseline());
        assert!(!seen.borrow().contains(&Seen::Completed));
    }
}

#[test]
fn rebuild_after_restart() {
    let scheduler = Scheduler::new();
    let config = BuildConfig::builder().time_scale(0.0).build().unwrap();
    let sequencer = ConstructionSequencer::new(&scheduler, config);

    sequencer.request_generation(3, 3, 1).unwrap();
    run_to_completion(&scheduler, &sequencer, FRAME, 1_000);
    let first = sequencer.grid().unwrap();

    assert!(matches!(
        sequencer.request_generation(3, 3, 2),
        Err(MazeError::MazeAlreadyBuilt)
    ));
    sequencer.restart();
    sequencer.request_generation(8, 2, 2).unwrap();
    run_to_completion(&scheduler, &sequencer, FRAME, 1_000);

    let second = sequencer.grid().unwrap();
    assert_eq!((first.rows(), first.cols()), (3, 3));
    assert_eq!((second.rows(), second.cols()), (8, 2));
    assert_eq!(sequencer.scene().blocks().len(), 16);
}

#[test]
fn shared_bus_and_fade_restart_flow() {
    let scheduler = Scheduler::new();
    let bus: EventBus<MazeEvent> = EventBus::new();
    let sequencer = ConstructionSequencer::builder()
        .config(BuildConfig::builder().time_scale(0.0).build().unwrap())
        .events(bus.clone())
        .build(&scheduler);

    let completions = Rc::new(RefCell::new(0));
    let c = completions.clone();
    let _sub = bus.subscribe(move |event| {
        if matches!(event, MazeEvent::GenerationCompleted(_)) {
            *c.borrow_mut() += 1;
        }
    });

    sequencer.request_generation(2, 2, 0).unwrap();
    run_to_completion(&scheduler, &sequencer, FRAME, 1_000);
    assert_eq!(*completions.borrow(), 1);

    // Fade to black, then tear down in the completion callback
    let mut fade = FadeOverlay::new(&scheduler, Color::BLACK);
    let handle = sequencer.clone();
    fade.fade_out(Duration::from_millis(500), Some(Box::new(move || handle.restart())))
        .unwrap();
    assert!(fade.blocks_input());

    for _ in 0..40 {
        scheduler.tick(FRAME);
    }
    assert_eq!(fade.alpha(), 1.0);
    assert!(!fade.blocks_input());
    assert_eq!(sequencer.phase(), Phase::Idle);
}
