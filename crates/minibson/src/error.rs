//! Error types for minibson operations.

use thiserror::Error;

/// The three failure kinds every operation reports through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The key or index exists but holds a different element type.
    BadCast,
    /// A buffer failed validation, or an argument cannot be honoured.
    InvalidArgument,
    /// The requested key or index does not exist.
    OutOfRange,
}

/// Error type for minibson operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // Tag errors
    /// Expected one element type but found another.
    #[error("bad cast: expected {expected}, found {found}")]
    BadCast {
        expected: &'static str,
        found: &'static str,
    },

    // Buffer / argument errors
    /// Buffer is not a structurally valid document.
    #[error("invalid document at offset {offset}: {reason}")]
    InvalidDocument { offset: usize, reason: &'static str },
    /// Destination buffer cannot hold the serialized document.
    #[error("buffer too small: need {needed} bytes, have {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },
    /// Key cannot be written as a C string.
    #[error("invalid key {0:?}: keys must not contain NUL")]
    InvalidKey(String),
    /// JSON input or output could not be converted.
    #[error("JSON conversion failed: {0}")]
    Json(String),

    // Lookup errors
    /// Key not present in the document.
    #[error("key {0:?} not found")]
    KeyNotFound(String),
    /// Array index out of bounds.
    #[error("index {index} out of bounds (length={len})")]
    IndexOutOfBounds { index: usize, len: usize },
}

impl Error {
    /// Which of the three failure kinds this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::BadCast { .. } => ErrorKind::BadCast,
            Error::InvalidDocument { .. }
            | Error::BufferTooSmall { .. }
            | Error::InvalidKey(_)
            | Error::Json(_) => ErrorKind::InvalidArgument,
            Error::KeyNotFound(_) | Error::IndexOutOfBounds { .. } => ErrorKind::OutOfRange,
        }
    }
}

/// Result type alias for minibson operations.
pub type Result<T> = std::result::Result<T, Error>;
