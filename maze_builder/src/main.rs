// main.rs - Headless driver: builds one maze and steps its construction to completion

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use maze_builder::animation::{ConstructionSequencer, Scheduler};
use maze_builder::config::{BuildConfig, MazeSettings};
use maze_builder::driver;
use maze_builder::events::MazeEvent;
use maze_builder::timer::RunTimer;

/// Upper bound on simulated ticks before giving up
const MAX_TICKS: u64 = 1_000_000;

/// CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Maze rows (clamped to 1..=99)
    #[arg(short, long, default_value = "10")]
    pub rows: u32,

    /// Maze columns (clamped to 1..=99)
    #[arg(short, long, default_value = "10")]
    pub cols: u32,

    /// Seed for the maze carver
    #[arg(short, long, default_value = "0")]
    pub seed: u64,

    /// Simulated frame length in milliseconds
    #[arg(long, default_value = "16")]
    pub tick_ms: u64,

    /// JSON file with build timing/geometry overrides
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the finished grid as JSON instead of ASCII
    #[arg(long)]
    pub json: bool,

    /// Pace ticks against the wall clock
    #[arg(long)]
    pub realtime: bool,

    /// Walk the player onto the goal once construction finishes
    #[arg(long)]
    pub enter_goal: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<BuildConfig> {
    match path {
        Some(path) => BuildConfig::from_json_file(path)
            .with_context(|| format!("loading build config from {}", path.display())),
        None => Ok(BuildConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    info!("Starting with {args:?}");

    if args.tick_ms == 0 {
        bail!("--tick-ms must be at least 1");
    }
    let tick = Duration::from_millis(args.tick_ms);
    let config = load_config(args.config.as_ref())?;
    let settings = MazeSettings::new(args.rows, args.cols, args.seed);

    let scheduler = Scheduler::new();
    let sequencer = ConstructionSequencer::new(&scheduler, config);
    let mut timer = RunTimer::new(&scheduler);

    sequencer
        .subscribe(|event| match event {
            MazeEvent::PhaseChanged(phase) => info!("Phase: {phase:?}"),
            MazeEvent::GenerationStarted => info!("Generation started"),
            MazeEvent::FocusedOnGoal => info!("Camera focused on goal"),
            MazeEvent::GenerationCompleted(grid) => {
                info!("Generation completed ({} cells)", grid.len())
            }
            MazeEvent::GoalCellEntered => info!("Goal reached"),
        })
        .detach();

    sequencer
        .request(settings)
        .context("requesting maze generation")?;

    let ticks = if args.realtime {
        driver::run_realtime(&scheduler, &sequencer, tick, MAX_TICKS).await
    } else {
        driver::run_to_completion(&scheduler, &sequencer, tick, MAX_TICKS)
    };
    let Some(ticks) = ticks else {
        bail!("construction did not finish within {MAX_TICKS} ticks");
    };
    let simulated = tick * u32::try_from(ticks).unwrap_or(u32::MAX);
    info!("Construction took {ticks} ticks ({:.2}s simulated)", simulated.as_secs_f32());

    let grid = sequencer
        .grid()
        .context("construction finished without a grid")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(grid.as_ref()).context("serializing grid")?
        );
    } else {
        print!("{grid}");
    }

    if args.enter_goal {
        timer.start();
        let (row, col) = grid.goal_cell();
        scheduler.tick(tick);
        sequencer.notify_cell_entered(row, col);
        timer.stop();
        driver::drain(&scheduler, tick, sequencer.config().camera_move_time() * 2);
        info!("Run time {}", timer.display());
    }

    Ok(())
}
