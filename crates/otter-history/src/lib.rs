//! # otter-history
//!
//! Versioned history for the Otter operational transform engine.
//!
//! This crate provides:
//! - An append-only, contiguously versioned log of committed operations
//! - The document snapshot at the latest version
//! - Catch-up queries (`entries_since`) for clients that fell behind
//! - Compaction: folding an old prefix of the log into one synthetic entry
//!
//! ## Example
//!
//! ```rust
//! use otter_core::Operation;
//! use otter_history::{HistoryEntry, VersionedHistory};
//!
//! let mut history = VersionedHistory::new();
//! let op = Operation::new().insert("hello");
//! let document = op.apply(history.document()).unwrap();
//! history.commit(HistoryEntry::new(1, "alice", op), document).unwrap();
//!
//! assert_eq!(history.current_version(), 1);
//! assert_eq!(history.document(), "hello");
//! ```

mod compaction;
mod error;
mod history;

pub use compaction::CompactionPolicy;
pub use error::{HistoryError, Result};
pub use history::{HistoryEntry, VersionedHistory, SYSTEM_CLIENT_ID};
