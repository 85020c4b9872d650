//! Error types for the Otter SDK.

use otter_core::OtError;
use otter_history::HistoryError;
use thiserror::Error;

/// Error type for SDK operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SdkError {
    #[error("Base version {base} precedes the earliest retained version {earliest}")]
    StaleBaseVersion { base: u64, earliest: u64 },

    #[error("Base version {base} is ahead of the current version {current}")]
    FutureBaseVersion { base: u64, current: u64 },

    #[error(transparent)]
    Operation(#[from] OtError),

    #[error(transparent)]
    History(HistoryError),

    #[error("Document closed: {0}")]
    DocumentClosed(String),

    #[error("Out-of-order broadcast: expected version {expected}, found {found}")]
    OutOfOrder { expected: u64, found: u64 },

    #[error("Unexpected message: {0}")]
    UnexpectedMessage(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SdkError {
    /// Stable error code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            SdkError::StaleBaseVersion { .. } => "StaleBaseVersion",
            SdkError::FutureBaseVersion { .. } => "FutureBaseVersion",
            SdkError::Operation(OtError::LengthMismatch { .. }) => "LengthMismatch",
            SdkError::Operation(OtError::DeleteContentMismatch { .. }) => "DeleteContentMismatch",
            SdkError::Operation(OtError::InvalidAction(_)) => "InvalidAction",
            SdkError::History(HistoryError::PrunedVersion { .. }) => "PrunedVersion",
            SdkError::History(HistoryError::VersionGap { .. }) => "VersionGap",
            SdkError::History(HistoryError::InvalidCheckpoint { .. }) => "InvalidCheckpoint",
            SdkError::History(HistoryError::Operation(_)) => "Operation",
            SdkError::DocumentClosed(_) => "DocumentClosed",
            SdkError::OutOfOrder { .. } => "OutOfOrder",
            SdkError::UnexpectedMessage(_) => "UnexpectedMessage",
            SdkError::SerializationError(_) => "SerializationError",
        }
    }
}

impl From<HistoryError> for SdkError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::Operation(err) => SdkError::Operation(err),
            other => SdkError::History(other),
        }
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::SerializationError(err.to_string())
    }
}

/// Result type for SDK operations.
pub type Result<T> = std::result::Result<T, SdkError>;
