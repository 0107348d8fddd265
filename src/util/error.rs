//! Error types for the meshbridge library.

use thiserror::Error;

/// Main error type for mesh conversion operations.
///
/// Per-attribute problems (a primvar that does not fit a channel, a type that
/// cannot cast to floats) are not errors - those are skipped with a logged
/// diagnostic so one bad primvar does not sacrifice the whole mesh. Only
/// mesh-level, unrecoverable problems surface through this type.
#[derive(Error, Debug)]
pub enum Error {
    /// Source or target mesh has no usable geometry at all
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A prim path or primvar name is not usable
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Primvar not found by name
    #[error("Primvar not found: {0}")]
    PrimvarNotFound(String),

    /// Channel index out of the supported range
    #[error("Channel {channel} out of range (supported: {min}..{max})")]
    ChannelOutOfRange { channel: i32, min: i32, max: i32 },

    /// Type mismatch when converting data
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Invalid data structure (inconsistent array sizes, bad indices)
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }
}

/// Result type alias for mesh conversion operations.
pub type Result<T> = std::result::Result<T, Error>;
