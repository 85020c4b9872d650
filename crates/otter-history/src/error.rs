//! Error types for the history log.

use otter_core::OtError;
use thiserror::Error;

/// Errors that can occur while reading, appending to or compacting history.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Version gap: expected version {expected}, found {found}")]
    VersionGap { expected: u64, found: u64 },

    #[error("Version {requested} has been compacted away (earliest retained: {earliest})")]
    PrunedVersion { requested: u64, earliest: u64 },

    #[error("Invalid checkpoint {checkpoint}: current version is {current}")]
    InvalidCheckpoint { checkpoint: u64, current: u64 },

    #[error(transparent)]
    Operation(#[from] OtError),
}

pub type Result<T> = std::result::Result<T, HistoryError>;
