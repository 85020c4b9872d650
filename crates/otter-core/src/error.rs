//! Error types for the operation algebra.

use thiserror::Error;

/// Errors raised while applying, composing or transforming operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtError {
    #[error("Length mismatch: expected {expected} characters, found {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Delete content mismatch at offset {offset}: expected {expected:?}, found {found:?}")]
    DeleteContentMismatch {
        offset: usize,
        expected: String,
        found: String,
    },

    #[error("Invalid action: {0}")]
    InvalidAction(String),
}

pub type Result<T> = std::result::Result<T, OtError>;
