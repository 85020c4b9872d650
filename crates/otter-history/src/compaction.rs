//! Automatic compaction policy.
//!
//! Decides when a document's history has grown enough to fold its old
//! prefix into a single entry, and where the checkpoint goes.

use crate::history::VersionedHistory;
use serde::{Deserialize, Serialize};

/// Policy for automatic history compaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionPolicy {
    /// Whether to compact automatically after commits.
    pub auto_compact: bool,

    /// Retained entry count above which compaction kicks in.
    pub max_retained_entries: usize,

    /// Number of most recent versions left uncompacted, so clients that are
    /// a little behind can still rebase their edits.
    pub keep_recent: u64,
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        CompactionPolicy {
            auto_compact: true,
            max_retained_entries: 1000,
            keep_recent: 200,
        }
    }
}

impl CompactionPolicy {
    /// A policy that never compacts on its own.
    pub fn disabled() -> Self {
        CompactionPolicy {
            auto_compact: false,
            ..Default::default()
        }
    }

    /// The checkpoint to compact at, if compaction is due.
    pub fn checkpoint_for(&self, history: &VersionedHistory) -> Option<u64> {
        if !self.auto_compact || history.len() <= self.max_retained_entries {
            return None;
        }
        let checkpoint = history.current_version().saturating_sub(self.keep_recent);
        (checkpoint > history.earliest_version()).then_some(checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryEntry;
    use otter_core::Operation;

    fn history_with(versions: u64) -> VersionedHistory {
        let mut history = VersionedHistory::new();
        for version in 1..=versions {
            let op = Operation::new()
                .retain(history.document().chars().count())
                .insert("x");
            let document = op.apply(history.document()).unwrap();
            history
                .commit(HistoryEntry::new(version, "alice", op), document)
                .unwrap();
        }
        history
    }

    #[test]
    fn test_below_threshold_does_nothing() {
        let policy = CompactionPolicy {
            auto_compact: true,
            max_retained_entries: 10,
            keep_recent: 2,
        };
        assert_eq!(policy.checkpoint_for(&history_with(10)), None);
    }

    #[test]
    fn test_checkpoint_keeps_recent_versions() {
        let policy = CompactionPolicy {
            auto_compact: true,
            max_retained_entries: 10,
            keep_recent: 3,
        };
        let mut history = history_with(12);
        assert_eq!(policy.checkpoint_for(&history), Some(9));

        history.compress_history(9).unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(policy.checkpoint_for(&history), None);
    }

    #[test]
    fn test_disabled_policy() {
        let policy = CompactionPolicy::disabled();
        assert_eq!(policy.checkpoint_for(&history_with(2000)), None);
    }

    #[test]
    fn test_policy_deserializes_with_defaults() {
        let policy: CompactionPolicy = serde_json::from_str(r#"{"keep_recent": 5}"#).unwrap();
        assert_eq!(policy.keep_recent, 5);
        assert!(policy.auto_compact);
        assert_eq!(policy.max_retained_entries, 1000);
    }
}
