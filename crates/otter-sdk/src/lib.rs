//! Otter SDK - server and client plumbing for collaborative text editing
//!
//! This SDK turns the operation algebra of `otter-core` and the version log
//! of `otter-history` into a working service: a controller that reconciles
//! concurrent edits, one actor task per document, a hub that routes wire
//! messages, and a client state machine that keeps local edits responsive.
//!
//! # Quick Start
//!
//! ```rust
//! use otter_core::Operation;
//! use otter_sdk::{ClientDocument, DocumentHub, ServerConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> otter_sdk::Result<()> {
//! let hub = DocumentHub::new(ServerConfig::default());
//! let doc = hub.open("meeting-notes");
//!
//! let mut alice = ClientDocument::new("alice");
//! if let Some(request) = alice.edit(Operation::new().insert("# Notes\n"))? {
//!     let committed = doc.submit(request).await?;
//!     alice.receive(&committed)?;
//! }
//!
//! assert_eq!(doc.snapshot().await?.text, "# Notes\n");
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`controller`] - Rebases incoming edits and commits them
//! - [`actor`] - Per-document task and its handle
//! - [`hub`] - Document registry and message routing
//! - [`client`] - Client-side submit/acknowledge state machine
//! - [`message`] - Wire messages
//! - [`config`] - Server configuration
//! - [`error`] - Error types

pub mod actor;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod hub;
pub mod message;

// Re-exports for convenience
pub use actor::{DocumentActor, DocumentHandle};
pub use client::{ClientDocument, ClientState};
pub use config::{ServerConfig, ServerConfigBuilder};
pub use controller::ConvergenceController;
pub use error::{Result, SdkError};
pub use hub::{DocumentHub, HubEvent};
pub use message::{Broadcast, ClientRequest, DocumentSnapshot, Message};

pub use otter_core::{Action, Operation, TieBreak};
pub use otter_history::CompactionPolicy;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::client::ClientDocument;
    pub use crate::config::ServerConfig;
    pub use crate::error::SdkError;
    pub use crate::hub::DocumentHub;
    pub use crate::message::{Broadcast, ClientRequest};
    pub use otter_core::{Operation, TieBreak};
}
