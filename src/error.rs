// src/error.rs

use thiserror::Error;

/// Errors surfaced by loading, exporting and editing. The scene builder and the
/// picker never fail; they skip bad geometry and report "no hit" instead.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid level '{level}': {reason}")]
    InvalidLevel { level: String, reason: String },

    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    #[error("entity {entity} has no key '{key}'")]
    MissingKey { entity: usize, key: String },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}

pub type Result<T> = std::result::Result<T, ViewerError>;
