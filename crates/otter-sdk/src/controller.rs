//! The convergence controller: the only path by which client edits become
//! part of a shared document.
//!
//! An incoming edit is anchored at the version its author last saw. The
//! controller rebases it over everything committed since, applies the result
//! and appends it to the history. Earlier commits win insertion ties.

use crate::error::{Result, SdkError};
use crate::message::Broadcast;
use otter_core::{Operation, TieBreak};
use otter_history::{CompactionPolicy, HistoryEntry, VersionedHistory};
use tracing::{debug, info, warn};

/// Reconciles client edits for one document.
#[derive(Clone, Debug)]
pub struct ConvergenceController {
    document_id: String,
    history: VersionedHistory,
    compaction: CompactionPolicy,
}

impl ConvergenceController {
    /// Create a controller for an empty document.
    pub fn new(document_id: impl Into<String>) -> Self {
        Self::with_policy(document_id, CompactionPolicy::default())
    }

    /// Create a controller with a custom compaction policy.
    pub fn with_policy(document_id: impl Into<String>, compaction: CompactionPolicy) -> Self {
        Self {
            document_id: document_id.into(),
            history: VersionedHistory::new(),
            compaction,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// The document at the current version.
    pub fn document(&self) -> &str {
        self.history.document()
    }

    /// The latest committed version.
    pub fn version(&self) -> u64 {
        self.history.current_version()
    }

    pub fn history_log(&self) -> &VersionedHistory {
        &self.history
    }

    /// Rebase `operation` from `base_version` onto the current document and commit it.
    ///
    /// Returns the new version and the operation as committed. On error nothing
    /// is committed.
    pub fn apply_operation(
        &mut self,
        client_id: &str,
        base_version: u64,
        operation: Operation,
    ) -> Result<(u64, Operation)> {
        match self.reconcile(client_id, base_version, operation) {
            Ok((version, committed)) => {
                self.compact_if_due();
                Ok((version, committed))
            }
            Err(err) => {
                warn!(
                    document = %self.document_id,
                    client = client_id,
                    base_version,
                    code = err.code(),
                    "rejected operation: {}",
                    err
                );
                Err(err)
            }
        }
    }

    fn reconcile(
        &mut self,
        client_id: &str,
        base_version: u64,
        operation: Operation,
    ) -> Result<(u64, Operation)> {
        self.check_anchor(base_version)?;

        let concurrent = self.history.entries_since(base_version)?;
        let mut rebased = operation;
        for entry in &concurrent {
            let (ours, _) = rebased.transform(&entry.operation, TieBreak::Right)?;
            rebased = ours;
        }

        let document = rebased.apply(self.history.document())?;
        let version = self.history.current_version() + 1;
        let entry = HistoryEntry::new(version, client_id, rebased.clone());
        self.history.commit(entry, document)?;

        debug!(
            document = %self.document_id,
            client = client_id,
            version,
            rebased_over = concurrent.len(),
            "committed operation"
        );
        Ok((version, rebased))
    }

    /// Everything committed after `since`, for clients catching up.
    ///
    /// Versions folded away by compaction are `PrunedVersion`.
    pub fn history(&self, since: u64) -> Result<Vec<Broadcast>> {
        let current = self.history.current_version();
        if since > current {
            return Err(SdkError::FutureBaseVersion {
                base: since,
                current,
            });
        }
        let entries = self.history.entries_since(since)?;
        Ok(entries.iter().map(Broadcast::from).collect())
    }

    /// Fold history up to `checkpoint` into one entry.
    ///
    /// Clients anchored before the checkpoint get `StaleBaseVersion` afterwards.
    pub fn compress_history(&mut self, checkpoint: u64) -> Result<usize> {
        let replaced = self.history.compress_history(checkpoint)?;
        if replaced > 0 {
            info!(document = %self.document_id, checkpoint, replaced, "history compressed");
        }
        Ok(replaced)
    }

    fn compact_if_due(&mut self) {
        if let Some(checkpoint) = self.compaction.checkpoint_for(&self.history) {
            // The commit already stands; a failed compaction only leaves a longer log.
            if let Err(err) = self.compress_history(checkpoint) {
                warn!(document = %self.document_id, checkpoint, "automatic compaction failed: {}", err);
            }
        }
    }

    fn check_anchor(&self, base_version: u64) -> Result<()> {
        let earliest = self.history.earliest_version();
        if base_version < earliest {
            return Err(SdkError::StaleBaseVersion {
                base: base_version,
                earliest,
            });
        }
        let current = self.history.current_version();
        if base_version > current {
            return Err(SdkError::FutureBaseVersion {
                base: base_version,
                current,
            });
        }
        Ok(())
    }
}
