use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

/// Failures at the edges of the simulation: files, images, checkpoints, config.
/// A tick itself never fails.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode track image {path}: {message}")]
    Image { path: PathBuf, message: String },
    #[error("track must be at least {min}x{min} pixels, got {width}x{height}")]
    TrackTooSmall { width: u32, height: u32, min: u32 },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("checkpoint encoding error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("unsupported checkpoint version {found} (expected {expected})")]
    CheckpointVersion { found: u32, expected: u32 },
    #[error("invalid checkpoint: {0}")]
    InvalidCheckpoint(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
