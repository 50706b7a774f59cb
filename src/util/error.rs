//! Error types for linemod.

use thiserror::Error;

/// Result alias for linemod operations.
pub type LinemodResult<T> = std::result::Result<T, LinemodError>;

/// Errors that can occur when loading templates or running detection.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LinemodError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Grid dimensions are zero or overflow.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Backing buffer does not match the requested dimensions.
    #[error("buffer size mismatch: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// An index (template id, level, ...) is outside its collection.
    #[error("{context} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// Opening or reading a file failed.
    #[error("i/o error: {reason}")]
    Io { reason: String },
    /// A point cloud payload could not be decoded.
    #[error("malformed point cloud: {reason}")]
    MalformedCloud { reason: String },
    /// A template signature could not be decoded.
    #[error("malformed template signature: {reason}")]
    Signature { reason: String },
    /// A required input frame has not been set.
    #[error("missing input: {0}")]
    MissingInput(&'static str),
}

impl From<std::io::Error> for LinemodError {
    fn from(err: std::io::Error) -> Self {
        LinemodError::Io {
            reason: err.to_string(),
        }
    }
}
