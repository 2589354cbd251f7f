// error_handling.rs - Errors surfaced by maze generation and the construction sequencer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MazeError {
    #[error("Invalid maze dimensions: {rows} rows x {cols} columns (both must be at least 1)")]
    InvalidDimensions { rows: u32, cols: u32 },

    #[error("A maze generation is already in flight")]
    GenerationInFlight,

    #[error("A maze is already built; restart before generating a new one")]
    MazeAlreadyBuilt,

    #[error("Invalid build configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MazeError>;

/// Reject dimensions below one before anything is allocated.
pub fn validate_dimensions(rows: u32, cols: u32) -> Result<()> {
    if rows < 1 || cols < 1 {
        return Err(MazeError::InvalidDimensions { rows, cols });
    }
    Ok(())
}
