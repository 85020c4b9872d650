//! # otter-core
//!
//! Operation algebra for the Otter operational transform engine.
//!
//! An [`Operation`] is an ordered list of [`Action`]s (retain, insert,
//! delete) that walks a document from start to end. Operations support:
//! - `apply`: run the edit against a document
//! - `compose`: merge two sequential edits into one
//! - `transform`: rebase two concurrent edits so both orders converge
//! - `invert`: build the edit that undoes another
//!
//! ## Example
//!
//! ```rust
//! use otter_core::{Operation, TieBreak};
//!
//! let doc = "hello";
//! let alice = Operation::new().retain(5).insert(" world");
//! let bob = Operation::new().delete(1, "h").insert("J").retain(4);
//!
//! let (alice2, bob2) = alice.transform(&bob, TieBreak::Left).unwrap();
//! let left = alice2.apply(&bob.apply(doc).unwrap()).unwrap();
//! let right = bob2.apply(&alice.apply(doc).unwrap()).unwrap();
//! assert_eq!(left, "Jello world");
//! assert_eq!(left, right);
//! ```

pub mod action;
pub mod error;
pub mod operation;

pub use action::Action;
pub use error::{OtError, Result};
pub use operation::{Operation, TieBreak};
