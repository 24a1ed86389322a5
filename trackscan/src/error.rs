use thiserror::Error;

/// Errors returned by the skeleton pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// The pixel buffer does not hold `width * height` RGBA pixels
    #[error("buffer has {actual} bytes, expected {expected} (width * height * 4)")]
    Shape { expected: usize, actual: usize },

    /// A grid access or a bounded search left the grid
    #[error("position ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i64, y: i64 },

    /// Junction analysis needs at least four path points
    #[error("path has {len} points, at least 4 are required")]
    InvalidPath { len: usize },

    #[error("invalid junction signature {name:?}: {reason}")]
    InvalidSignature { name: String, reason: String },

    #[error("unknown turn label {0:?}")]
    UnknownTurn(String),

    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("thinning was cancelled")]
    Cancelled,

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
