// lib.rs - Library exports for maze-builder
// Maze generation plus the tick-driven animation state that stages its construction

pub mod animation;
pub mod config;
pub mod driver;
pub mod error_handling;
pub mod events;
pub mod maze;
pub mod scene;
pub mod timer;

// Re-export commonly used types
pub use animation::{ConstructionSequencer, Phase, Scheduler, Tween, Vec3};
pub use config::{BuildConfig, MazeSettings};
pub use error_handling::{MazeError, Result};
pub use events::{EventBus, MazeEvent, Subscription};
pub use maze::{generate, Grid, MazeGenerator};
pub use scene::MazeScene;
