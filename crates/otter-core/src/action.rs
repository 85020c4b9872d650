//! Edit primitives.
//!
//! An [`Action`] is one step of an operation's walk over a document: keep
//! characters, produce new ones, or consume existing ones. Lengths are counted
//! in `char`s, never in bytes.

use crate::error::OtError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single edit step.
///
/// On the wire an action is one of
/// `{"retain": n}`, `{"insert": "text"}` or `{"delete": n, "removed": "text"}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ActionRepr", into = "ActionRepr")]
pub enum Action {
    /// Advance the cursor over `n` characters without changing them.
    Retain(usize),
    /// Insert text at the cursor.
    Insert(String),
    /// Remove `len` characters at the cursor.
    Delete {
        len: usize,
        /// The text being removed, checked against the document on apply.
        removed: String,
    },
}

impl Action {
    /// Check that a delete's removed text has exactly `len` characters.
    pub fn validate(&self) -> Result<(), OtError> {
        if let Action::Delete { len, removed } = self {
            let removed_len = removed.chars().count();
            if removed_len != *len {
                return Err(OtError::InvalidAction(format!(
                    "delete of {} characters carries {} removed characters",
                    len, removed_len
                )));
            }
        }
        Ok(())
    }

    /// Number of characters this action walks over (consumed or produced).
    pub fn len(&self) -> usize {
        match self {
            Action::Retain(n) => *n,
            Action::Insert(text) => text.chars().count(),
            Action::Delete { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_retain(&self) -> bool {
        matches!(self, Action::Retain(_))
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Action::Insert(_))
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Action::Delete { .. })
    }

    /// Characters consumed from the source document.
    pub fn base_len(&self) -> usize {
        match self {
            Action::Retain(n) => *n,
            Action::Insert(_) => 0,
            Action::Delete { len, .. } => *len,
        }
    }

    /// Characters produced in the resulting document.
    pub fn target_len(&self) -> usize {
        match self {
            Action::Retain(n) => *n,
            Action::Insert(text) => text.chars().count(),
            Action::Delete { .. } => 0,
        }
    }

    /// Split into the first `n` characters and the remainder.
    ///
    /// `n` is clamped to the action length, so the remainder may be empty.
    pub fn split_at(&self, n: usize) -> (Action, Action) {
        match self {
            Action::Retain(len) => {
                let n = n.min(*len);
                (Action::Retain(n), Action::Retain(len - n))
            }
            Action::Insert(text) => {
                let (front, back) = split_chars(text, n);
                (Action::Insert(front.to_string()), Action::Insert(back.to_string()))
            }
            Action::Delete { len, removed } => {
                let n = n.min(*len);
                let (front, back) = split_chars(removed, n);
                (
                    Action::Delete {
                        len: n,
                        removed: front.to_string(),
                    },
                    Action::Delete {
                        len: len - n,
                        removed: back.to_string(),
                    },
                )
            }
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Retain(n) => write!(f, "retain({})", n),
            Action::Insert(text) => write!(f, "insert({:?})", text),
            Action::Delete { len, removed } => write!(f, "delete({}, {:?})", len, removed),
        }
    }
}

/// Split `text` after its first `n` chars.
pub(crate) fn split_chars(text: &str, n: usize) -> (&str, &str) {
    match text.char_indices().nth(n) {
        Some((idx, _)) => text.split_at(idx),
        None => (text, ""),
    }
}

/// Wire shape of an action.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ActionRepr {
    Retain { retain: usize },
    Insert { insert: String },
    Delete { delete: usize, removed: String },
}

impl TryFrom<ActionRepr> for Action {
    type Error = OtError;

    fn try_from(repr: ActionRepr) -> Result<Self, Self::Error> {
        let action = match repr {
            ActionRepr::Retain { retain } => Action::Retain(retain),
            ActionRepr::Insert { insert } => Action::Insert(insert),
            ActionRepr::Delete { delete, removed } => Action::Delete {
                len: delete,
                removed,
            },
        };

        action.validate()?;
        if action.is_empty() {
            return Err(OtError::InvalidAction(format!("zero-length {}", action)));
        }
        Ok(action)
    }
}

impl From<Action> for ActionRepr {
    fn from(action: Action) -> Self {
        match action {
            Action::Retain(retain) => ActionRepr::Retain { retain },
            Action::Insert(insert) => ActionRepr::Insert { insert },
            Action::Delete { len, removed } => ActionRepr::Delete {
                delete: len,
                removed,
            },
        }
    }
}
