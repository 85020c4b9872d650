//! Append-only log of committed operations.
//!
//! Versions are contiguous: the entry at version `v` turns the document at
//! version `v - 1` into the document at version `v`. Version 0 is the empty
//! document. Compaction folds a prefix of the log into one synthetic entry,
//! after which clients can no longer anchor edits before the checkpoint.

use crate::error::{HistoryError, Result};
use chrono::{DateTime, Utc};
use otter_core::Operation;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Client id carried by entries produced by compaction.
pub const SYSTEM_CLIENT_ID: &str = "system";

/// One committed operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Version this entry produces.
    pub version: u64,
    /// The client that submitted the edit.
    pub client_id: String,
    /// When the entry was committed.
    pub timestamp: DateTime<Utc>,
    /// The operation as committed (already transformed).
    pub operation: Operation,
}

impl HistoryEntry {
    pub fn new(version: u64, client_id: impl Into<String>, operation: Operation) -> Self {
        Self {
            version,
            client_id: client_id.into(),
            timestamp: Utc::now(),
            operation,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether this entry was produced by compaction.
    pub fn is_synthetic(&self) -> bool {
        self.client_id == SYSTEM_CLIENT_ID
    }
}

/// The version log plus the current document snapshot.
#[derive(Clone, Debug, Default)]
pub struct VersionedHistory {
    entries: Vec<HistoryEntry>,
    /// Earliest version an edit may still be anchored to.
    floor: u64,
    /// Document length produced by the log.
    log_len: usize,
    document: String,
}

impl VersionedHistory {
    /// Create an empty history (version 0, empty document).
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest committed version.
    pub fn current_version(&self) -> u64 {
        self.entries.last().map_or(self.floor, |entry| entry.version)
    }

    /// The earliest version entries can still be fetched after.
    pub fn earliest_version(&self) -> u64 {
        self.floor
    }

    /// The document at the current version.
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Retained entries, oldest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry to the log without touching the snapshot.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<u64> {
        let expected = self.current_version() + 1;
        if entry.version != expected {
            return Err(HistoryError::VersionGap {
                expected,
                found: entry.version,
            });
        }
        if entry.operation.base_len() != self.log_len {
            return Err(otter_core::OtError::LengthMismatch {
                expected: self.log_len,
                actual: entry.operation.base_len(),
            }
            .into());
        }

        self.log_len = entry.operation.target_len();
        self.entries.push(entry);
        Ok(expected)
    }

    /// Append an entry and replace the snapshot with `document`, the text it produces.
    ///
    /// Nothing changes if the append is rejected.
    pub fn commit(&mut self, entry: HistoryEntry, document: String) -> Result<u64> {
        let version = self.append(entry)?;
        self.document = document;
        Ok(version)
    }

    /// Entries committed after `version`, oldest first.
    ///
    /// Returns an owned copy so the caller can work on it while the log grows.
    pub fn entries_since(&self, version: u64) -> Result<Vec<HistoryEntry>> {
        if version < self.floor {
            return Err(HistoryError::PrunedVersion {
                requested: version,
                earliest: self.floor,
            });
        }
        let start = self.entries.partition_point(|entry| entry.version <= version);
        Ok(self.entries[start..].to_vec())
    }

    /// Fold every entry up to and including `checkpoint` into one synthetic entry.
    ///
    /// Returns the number of entries replaced. Checkpoints at or below the
    /// current floor are a no-op.
    pub fn compress_history(&mut self, checkpoint: u64) -> Result<usize> {
        let current = self.current_version();
        if checkpoint > current {
            return Err(HistoryError::InvalidCheckpoint {
                checkpoint,
                current,
            });
        }
        if checkpoint <= self.floor {
            return Ok(0);
        }

        let split = self
            .entries
            .partition_point(|entry| entry.version <= checkpoint);
        let replaced = &self.entries[..split];

        let mut composed = Operation::new();
        for entry in replaced {
            composed = composed.compose(&entry.operation)?;
        }
        let timestamp = replaced
            .last()
            .map_or_else(Utc::now, |entry| entry.timestamp);

        let synthetic = HistoryEntry::new(checkpoint, SYSTEM_CLIENT_ID, composed)
            .with_timestamp(timestamp);
        let retained = self.entries.split_off(split);
        self.entries = std::iter::once(synthetic).chain(retained).collect();
        self.floor = checkpoint;

        info!(checkpoint, replaced = split, retained = self.entries.len(), "compacted history");
        Ok(split)
    }

    /// Rebuild the document by applying every retained entry to the empty document.
    pub fn replay(&self) -> Result<String> {
        let mut document = String::new();
        for entry in &self.entries {
            document = entry.operation.apply(&document)?;
        }
        Ok(document)
    }
}
