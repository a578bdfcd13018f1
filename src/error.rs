//! Error types shared by the filter and the counters.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SketchError>;

/// Errors raised by sketch construction, merging, validation and decoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SketchError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("invalid parameters: {0}")]
    Construction(String),

    #[error("cannot merge incompatible sketches: {0}")]
    IncompatibleMerge(String),

    #[error("index {index} out of bounds for storage of size {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("malformed sketch bytes: {0}")]
    InvalidData(String),
}
