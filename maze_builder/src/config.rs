// config.rs - Build timings, geometry and player-facing maze settings

use std::path::Path;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

use crate::animation::{CameraPose, Vec3};
use crate::error_handling::{MazeError, Result};

// ============================================================================
// DEFAULTS
// ============================================================================

pub const DEFAULT_BLOCK_SIZE: f32 = 10.0;
pub const DEFAULT_WALL_HEIGHT: f32 = 10.0;
pub const DEFAULT_FLOOR_ROTATIONS: u32 = 2;

pub const FLOOR_SCALE_MS: u64 = 1500;
pub const WALL_SCALE_MS: u64 = 1000;
pub const LIGHT_STAGGER_MS: u64 = 10;
pub const CAMERA_MOVE_MS: u64 = 500;
pub const GOAL_REVEAL_MS: u64 = 500;
pub const GOAL_HOLD_MS: u64 = 1500;
pub const SPAWN_SETTLE_MS: u64 = 1000;

pub const MIN_DIMENSION: u32 = 1;
pub const MAX_DIMENSION: u32 = 99;

// Stagger must stay well under a camera move or lighting outlasts the reveal
const_assert!(LIGHT_STAGGER_MS < CAMERA_MOVE_MS);
const_assert!(DEFAULT_FLOOR_ROTATIONS > 0);
const_assert!(MIN_DIMENSION > 0 && MIN_DIMENSION <= MAX_DIMENSION);

fn millis_to_secs(ms: u64) -> f32 {
    ms as f32 / 1000.0
}

// Rounded to the nanosecond so 0.01 s reads back as exactly 10 ms
fn secs_to_duration(secs: f32) -> Duration {
    Duration::from_nanos((f64::from(secs) * 1e9).round() as u64)
}

// ============================================================================
// BUILD CONFIG
// ============================================================================

/// Geometry and timing for one construction run. Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub block_size: f32,
    pub wall_height: f32,
    pub floor_rotations: u32,
    pub floor_scale_secs: f32,
    pub wall_scale_secs: f32,
    pub light_stagger_secs: f32,
    pub camera_move_secs: f32,
    pub goal_reveal_secs: f32,
    pub goal_hold_secs: f32,
    pub spawn_settle_secs: f32,
    pub floor_center: Vec3,
    pub camera: CameraPose,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            wall_height: DEFAULT_WALL_HEIGHT,
            floor_rotations: DEFAULT_FLOOR_ROTATIONS,
            floor_scale_secs: millis_to_secs(FLOOR_SCALE_MS),
            wall_scale_secs: millis_to_secs(WALL_SCALE_MS),
            light_stagger_secs: millis_to_secs(LIGHT_STAGGER_MS),
            camera_move_secs: millis_to_secs(CAMERA_MOVE_MS),
            goal_reveal_secs: millis_to_secs(GOAL_REVEAL_MS),
            goal_hold_secs: millis_to_secs(GOAL_HOLD_MS),
            spawn_settle_secs: millis_to_secs(SPAWN_SETTLE_MS),
            floor_center: Vec3::zero(),
            camera: CameraPose::new(Vec3::new(0.0, 60.0, -60.0), Vec3::new(0.0, -1.0, 1.0)),
        }
    }
}

impl BuildConfig {
    pub fn builder() -> BuildConfigBuilder {
        BuildConfigBuilder::default()
    }

    /// Load overrides from JSON; missing fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: BuildConfig = serde_json::from_str(&text)?;
        config.validate()?;
        info!("Loaded build config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.block_size > 0.0 && self.block_size.is_finite()) {
            return Err(MazeError::Config(format!(
                "block_size must be positive, got {}",
                self.block_size
            )));
        }
        if !(self.wall_height > 0.0 && self.wall_height.is_finite()) {
            return Err(MazeError::Config(format!(
                "wall_height must be positive, got {}",
                self.wall_height
            )));
        }

        let timings = [
            ("floor_scale_secs", self.floor_scale_secs),
            ("wall_scale_secs", self.wall_scale_secs),
            ("light_stagger_secs", self.light_stagger_secs),
            ("camera_move_secs", self.camera_move_secs),
            ("goal_reveal_secs", self.goal_reveal_secs),
            ("goal_hold_secs", self.goal_hold_secs),
            ("spawn_settle_secs", self.spawn_settle_secs),
        ];
        for (name, secs) in timings {
            if !(secs >= 0.0 && secs.is_finite()) {
                return Err(MazeError::Config(format!(
                    "{name} must be a non-negative number of seconds, got {secs}"
                )));
            }
        }

        if self.camera.forward == Vec3::zero() {
            return Err(MazeError::Config("camera forward must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn floor_scale_time(&self) -> Duration {
        secs_to_duration(self.floor_scale_secs)
    }

    pub fn wall_scale_time(&self) -> Duration {
        secs_to_duration(self.wall_scale_secs)
    }

    pub fn light_stagger(&self) -> Duration {
        secs_to_duration(self.light_stagger_secs)
    }

    pub fn camera_move_time(&self) -> Duration {
        secs_to_duration(self.camera_move_secs)
    }

    pub fn goal_reveal_delay(&self) -> Duration {
        secs_to_duration(self.goal_reveal_secs)
    }

    pub fn goal_hold(&self) -> Duration {
        secs_to_duration(self.goal_hold_secs)
    }

    pub fn spawn_settle(&self) -> Duration {
        secs_to_duration(self.spawn_settle_secs)
    }
}

/// Programmatic overrides on top of the defaults
#[derive(Debug, Default)]
pub struct BuildConfigBuilder {
    config: BuildConfig,
}

impl BuildConfigBuilder {
    pub fn block_size(mut self, size: f32) -> Self {
        self.config.block_size = size;
        self
    }

    pub fn wall_height(mut self, height: f32) -> Self {
        self.config.wall_height = height;
        self
    }

    pub fn floor_rotations(mut self, rotations: u32) -> Self {
        self.config.floor_rotations = rotations;
        self
    }

    pub fn floor_center(mut self, center: Vec3) -> Self {
        self.config.floor_center = center;
        self
    }

    pub fn camera(mut self, pose: CameraPose) -> Self {
        self.config.camera = pose;
        self
    }

    /// Multiply every duration by `factor`; 0 makes the whole build instant
    pub fn time_scale(mut self, factor: f32) -> Self {
        let c = &mut self.config;
        for secs in [
            &mut c.floor_scale_secs,
            &mut c.wall_scale_secs,
            &mut c.light_stagger_secs,
            &mut c.camera_move_secs,
            &mut c.goal_reveal_secs,
            &mut c.goal_hold_secs,
            &mut c.spawn_settle_secs,
        ] {
            *secs *= factor;
        }
        self
    }

    pub fn build(self) -> Result<BuildConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ============================================================================
// MAZE SETTINGS
// ============================================================================

/// Player-chosen maze request. Dimensions are clamped to 1..=99.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeSettings {
    rows: u32,
    cols: u32,
    pub seed: u64,
}

impl Default for MazeSettings {
    fn default() -> Self {
        Self {
            rows: MIN_DIMENSION,
            cols: MIN_DIMENSION,
            seed: 0,
        }
    }
}

impl MazeSettings {
    pub fn new(rows: u32, cols: u32, seed: u64) -> Self {
        Self {
            rows: clamp_dimension(rows),
            cols: clamp_dimension(cols),
            seed,
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn set_rows(&mut self, rows: u32) {
        self.rows = clamp_dimension(rows);
    }

    pub fn set_cols(&mut self, cols: u32) {
        self.cols = clamp_dimension(cols);
    }

    /// Step a dimension up or down, staying inside the allowed range
    pub fn adjust_rows(&mut self, delta: i32) {
        self.rows = clamp_dimension(self.rows.saturating_add_signed(delta));
    }

    pub fn adjust_cols(&mut self, delta: i32) {
        self.cols = clamp_dimension(self.cols.saturating_add_signed(delta));
    }
}

fn clamp_dimension(value: u32) -> u32 {
    value.clamp(MIN_DIMENSION, MAX_DIMENSION)
}
