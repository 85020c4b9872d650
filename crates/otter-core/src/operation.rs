//! Operations - ordered action sequences and their algebra.
//!
//! An operation walks a document from start to end. Two algorithms make
//! concurrent editing converge:
//!  - compose:   apply(a.compose(b), d) = apply(b, apply(a, d))
//!  - transform: (a', b') = a.transform(b) with apply(a', apply(b, d)) = apply(b', apply(a, d))
//!
//! Both walk the two action streams in lockstep, consuming the shorter
//! pending length at each step.

use crate::action::Action;
use crate::error::{OtError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decides whose insertion comes first when both sides insert at the same offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// The receiver (`self`) inserts first.
    Left,
    /// The argument (`other`) inserts first.
    Right,
}

/// An ordered sequence of actions describing one edit.
///
/// Serializes as a plain JSON list of actions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Action>", into = "Vec<Action>")]
pub struct Operation {
    actions: Vec<Action>,
    base_len: usize,
    target_len: usize,
}

impl Operation {
    /// Create an empty operation (applicable to the empty document only).
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the next `n` characters.
    pub fn retain(mut self, n: usize) -> Self {
        self.push(Action::Retain(n));
        self
    }

    /// Insert `text` at the cursor.
    pub fn insert(mut self, text: impl Into<String>) -> Self {
        self.push(Action::Insert(text.into()));
        self
    }

    /// Delete the next `n` characters, which must read `removed`.
    ///
    /// `removed` should have `n` characters; `compose` and `transform` reject
    /// operations where it does not.
    pub fn delete(mut self, n: usize, removed: impl Into<String>) -> Self {
        self.push(Action::Delete {
            len: n,
            removed: removed.into(),
        });
        self
    }

    /// Append an action. Zero-length actions are ignored.
    pub fn push(&mut self, action: Action) {
        if action.is_empty() {
            return;
        }
        self.base_len += action.base_len();
        self.target_len += action.target_len();
        self.actions.push(action);
    }

    /// Append an action, merging it into the last one when both are the same kind.
    fn push_merged(&mut self, action: Action) {
        if action.is_empty() {
            return;
        }
        self.base_len += action.base_len();
        self.target_len += action.target_len();

        let merged = match (self.actions.last_mut(), &action) {
            (Some(Action::Retain(n)), Action::Retain(more)) => {
                *n += more;
                true
            }
            (Some(Action::Insert(text)), Action::Insert(more)) => {
                text.push_str(more);
                true
            }
            (
                Some(Action::Delete { len, removed }),
                Action::Delete {
                    len: more,
                    removed: more_removed,
                },
            ) => {
                *len += more;
                removed.push_str(more_removed);
                true
            }
            _ => false,
        };

        if !merged {
            self.actions.push(action);
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Characters consumed from the source document.
    pub fn base_len(&self) -> usize {
        self.base_len
    }

    /// Characters in the resulting document.
    pub fn target_len(&self) -> usize {
        self.target_len
    }

    /// True if applying this operation leaves any document unchanged.
    pub fn is_noop(&self) -> bool {
        self.actions.iter().all(Action::is_retain)
    }

    /// Canonical form: adjacent actions of the same kind merged, no
    /// zero-length actions, order otherwise preserved.
    pub fn normalize(&self) -> Operation {
        let mut normalized = Operation::new();
        for action in &self.actions {
            normalized.push_merged(action.clone());
        }
        normalized
    }

    /// Apply to `doc`, returning the edited text.
    pub fn apply(&self, doc: &str) -> Result<String> {
        let doc_len = doc.chars().count();
        if doc_len != self.base_len {
            return Err(OtError::LengthMismatch {
                expected: self.base_len,
                actual: doc_len,
            });
        }

        let mut result = String::with_capacity(doc.len());
        let mut chars = doc.chars();
        let mut offset = 0;

        for action in &self.actions {
            match action {
                Action::Retain(n) => {
                    result.extend(chars.by_ref().take(*n));
                    offset += n;
                }
                Action::Insert(text) => result.push_str(text),
                Action::Delete { len, removed } => {
                    let found: String = chars.by_ref().take(*len).collect();
                    if found != *removed {
                        return Err(OtError::DeleteContentMismatch {
                            offset,
                            expected: removed.clone(),
                            found,
                        });
                    }
                    offset += len;
                }
            }
        }

        Ok(result)
    }

    /// Check every action with [`Action::validate`].
    pub fn validate(&self) -> Result<()> {
        self.actions.iter().try_for_each(Action::validate)
    }

    /// Merge `self` followed by `other` into one operation.
    pub fn compose(&self, other: &Operation) -> Result<Operation> {
        self.validate()?;
        other.validate()?;
        if self.target_len != other.base_len {
            return Err(OtError::LengthMismatch {
                expected: self.target_len,
                actual: other.base_len,
            });
        }

        let mut composed = Operation::new();
        let mut first = Cursor::new(&self.actions);
        let mut second = Cursor::new(&other.actions);

        loop {
            let (a, b) = match (first.kind(), second.kind()) {
                (None, None) => break,
                (Some(Kind::Delete), None) => {
                    composed.push_merged(first.take_all());
                    continue;
                }
                (None, Some(Kind::Insert)) => {
                    composed.push_merged(second.take_all());
                    continue;
                }
                (Some(a), Some(b)) => (a, b),
                _ => {
                    return Err(OtError::LengthMismatch {
                        expected: self.target_len,
                        actual: other.base_len,
                    })
                }
            };
            let step = first.head_len().min(second.head_len());

            match (a, b) {
                (Kind::Retain, Kind::Retain) => {
                    first.take(step);
                    second.take(step);
                    composed.push_merged(Action::Retain(step));
                }
                (Kind::Retain, Kind::Insert) => composed.push_merged(second.take_all()),
                (Kind::Retain, Kind::Delete) => {
                    first.take(step);
                    composed.push_merged(second.take(step));
                }
                (Kind::Insert, Kind::Retain) => {
                    second.take(step);
                    composed.push_merged(first.take(step));
                }
                (Kind::Insert, Kind::Insert) => composed.push_merged(second.take_all()),
                // The inserted text is deleted straight away: nothing survives.
                (Kind::Insert, Kind::Delete) => {
                    first.take(step);
                    second.take(step);
                }
                // Deletes in `self` act before `other` ever sees the document.
                (Kind::Delete, Kind::Retain) => composed.push_merged(first.take_all()),
                (Kind::Delete, Kind::Insert) => composed.push_merged(first.take_all()),
                (Kind::Delete, Kind::Delete) => composed.push_merged(first.take_all()),
            }
        }

        Ok(composed)
    }

    /// Rebase two concurrent operations against each other.
    ///
    /// Returns `(self', other')` where `self'` applies after `other` and
    /// `other'` applies after `self`, both yielding the same document.
    pub fn transform(&self, other: &Operation, tie_break: TieBreak) -> Result<(Operation, Operation)> {
        self.validate()?;
        other.validate()?;
        if self.base_len != other.base_len {
            return Err(OtError::LengthMismatch {
                expected: self.base_len,
                actual: other.base_len,
            });
        }

        let mut ours_prime = Operation::new();
        let mut theirs_prime = Operation::new();
        let mut ours = Cursor::new(&self.actions);
        let mut theirs = Cursor::new(&other.actions);

        loop {
            let ours_first = match (ours.kind(), theirs.kind()) {
                (None, None) => break,
                (Some(Kind::Insert), Some(Kind::Insert)) => tie_break == TieBreak::Left,
                (Some(Kind::Insert), _) => true,
                (_, Some(Kind::Insert)) => false,
                (Some(a), Some(b)) => {
                    let step = ours.head_len().min(theirs.head_len());
                    let our_part = ours.take(step);
                    let their_part = theirs.take(step);
                    match (a, b) {
                        (Kind::Retain, Kind::Retain) => {
                            ours_prime.push_merged(Action::Retain(step));
                            theirs_prime.push_merged(Action::Retain(step));
                        }
                        // Only the deleting side keeps the delete; the other
                        // side's range is already gone.
                        (Kind::Delete, Kind::Retain) => ours_prime.push_merged(our_part),
                        (Kind::Retain, Kind::Delete) => theirs_prime.push_merged(their_part),
                        (Kind::Delete, Kind::Delete) => {}
                        (Kind::Insert, _) | (_, Kind::Insert) => {}
                    }
                    continue;
                }
                _ => {
                    return Err(OtError::LengthMismatch {
                        expected: self.base_len,
                        actual: other.base_len,
                    })
                }
            };

            if ours_first {
                let insert = ours.take_all();
                theirs_prime.push_merged(Action::Retain(insert.len()));
                ours_prime.push_merged(insert);
            } else {
                let insert = theirs.take_all();
                ours_prime.push_merged(Action::Retain(insert.len()));
                theirs_prime.push_merged(insert);
            }
        }

        Ok((ours_prime, theirs_prime))
    }

    /// The operation that undoes `self`.
    ///
    /// Relies on every delete carrying the text it removes.
    pub fn invert(&self) -> Operation {
        let mut inverse = Operation::new();
        for action in &self.actions {
            match action {
                Action::Retain(n) => inverse.push_merged(Action::Retain(*n)),
                Action::Insert(text) => inverse.push_merged(Action::Delete {
                    len: text.chars().count(),
                    removed: text.clone(),
                }),
                Action::Delete { removed, .. } => {
                    inverse.push_merged(Action::Insert(removed.clone()))
                }
            }
        }
        inverse
    }
}

impl From<Vec<Action>> for Operation {
    fn from(actions: Vec<Action>) -> Self {
        let mut operation = Operation::new();
        for action in actions {
            operation.push(action);
        }
        operation
    }
}

impl From<Operation> for Vec<Action> {
    fn from(operation: Operation) -> Self {
        operation.actions
    }
}

impl FromIterator<Action> for Operation {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        let mut operation = Operation::new();
        for action in iter {
            operation.push(action);
        }
        operation
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, action) in self.actions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", action)?;
        }
        write!(f, "]")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Retain,
    Insert,
    Delete,
}

/// Walks an action list, handing out whole or partial actions.
struct Cursor<'a> {
    rest: std::slice::Iter<'a, Action>,
    head: Option<Action>,
}

impl<'a> Cursor<'a> {
    fn new(actions: &'a [Action]) -> Self {
        let mut rest = actions.iter();
        let head = rest.next().cloned();
        Self { rest, head }
    }

    fn kind(&self) -> Option<Kind> {
        self.head.as_ref().map(|action| match action {
            Action::Retain(_) => Kind::Retain,
            Action::Insert(_) => Kind::Insert,
            Action::Delete { .. } => Kind::Delete,
        })
    }

    fn head_len(&self) -> usize {
        self.head.as_ref().map_or(0, Action::len)
    }

    // An exhausted cursor yields `Retain(0)`, which `push_merged` drops.
    fn take_all(&mut self) -> Action {
        let head = self.head.take().unwrap_or(Action::Retain(0));
        self.head = self.rest.next().cloned();
        head
    }

    fn take(&mut self, n: usize) -> Action {
        match self.head.take() {
            Some(head) if n < head.len() => {
                let (front, back) = head.split_at(n);
                self.head = Some(back);
                front
            }
            Some(head) => {
                self.head = self.rest.next().cloned();
                head
            }
            None => Action::Retain(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_tracks_lengths() {
        let op = Operation::new().retain(5).insert(" world").delete(2, "ab");
        assert_eq!(op.base_len(), 7);
        assert_eq!(op.target_len(), 11);
        assert_eq!(op.actions().len(), 3);
    }

    #[test]
    fn test_zero_length_calls_are_ignored() {
        let op = Operation::new().retain(0).insert("").delete(0, "");
        assert!(op.actions().is_empty());
        assert!(op.is_noop());
    }

    #[test]
    fn test_inconsistent_delete_is_rejected() {
        // Two characters deleted, three recorded.
        let bad = Operation::new().delete(2, "abc");
        let other = Operation::new().delete(2, "ab");

        assert!(matches!(
            bad.transform(&other, TieBreak::Left),
            Err(OtError::InvalidAction(_))
        ));
        assert!(matches!(
            other.transform(&bad, TieBreak::Right),
            Err(OtError::InvalidAction(_))
        ));
        assert!(matches!(
            Operation::new().insert("ab").compose(&bad),
            Err(OtError::InvalidAction(_))
        ));
        assert!(bad.validate().is_err());
        assert!(other.validate().is_ok());
    }

    #[test]
    fn test_normalize_merges_adjacent() {
        let op = Operation::new()
            .retain(2)
            .retain(3)
            .insert("a")
            .insert("b")
            .delete(1, "x")
            .delete(2, "yz");
        let normalized = op.normalize();

        assert_eq!(
            normalized,
            Operation::new().retain(5).insert("ab").delete(3, "xyz")
        );
        assert_eq!(normalized.normalize(), normalized);
    }

    #[test]
    fn test_apply_insert() {
        let op = Operation::new().retain(5).insert(" world");
        assert_eq!(op.apply("hello").unwrap(), "hello world");
    }

    #[test]
    fn test_apply_delete_then_length_mismatch() {
        let op = Operation::new().delete(5, "hello");
        assert_eq!(op.apply("hello").unwrap(), "");

        let err = Operation::new().delete(1, "x").apply("").unwrap_err();
        assert_eq!(
            err,
            OtError::LengthMismatch {
                expected: 1,
                actual: 0
            }
        );
    }

    #[test]
    fn test_apply_detects_wrong_removed_text() {
        let op = Operation::new().retain(1).delete(2, "xx");
        let err = op.apply("abc").unwrap_err();
        assert_eq!(
            err,
            OtError::DeleteContentMismatch {
                offset: 1,
                expected: "xx".to_string(),
                found: "bc".to_string()
            }
        );
    }

    #[test]
    fn test_retain_all_is_identity() {
        let op = Operation::new().retain(4);
        assert_eq!(op.apply("abcd").unwrap(), "abcd");
    }

    #[test]
    fn test_compose_sequential_edits() {
        let a = Operation::new().retain(5).insert(" world");
        let b = Operation::new().delete(1, "h").insert("H").retain(10);
        let composed = a.compose(&b).unwrap();

        assert_eq!(composed.apply("hello").unwrap(), "Hello world");
        assert_eq!(composed.base_len(), 5);
        assert_eq!(composed.target_len(), 11);
    }

    #[test]
    fn test_compose_insert_then_delete_cancels() {
        let a = Operation::new().insert("abc");
        let b = Operation::new().delete(3, "abc");
        let composed = a.compose(&b).unwrap();

        assert!(composed.actions().is_empty());
        assert_eq!(composed.apply("").unwrap(), "");
    }

    #[test]
    fn test_compose_partial_overlap() {
        // "abcdef" -> "abXYcdef" -> "aYcdf"
        let a = Operation::new().retain(2).insert("XY").retain(4);
        let b = Operation::new()
            .retain(1)
            .delete(2, "bX")
            .retain(3)
            .delete(1, "e")
            .retain(1);
        let composed = a.compose(&b).unwrap();

        assert_eq!(composed.apply("abcdef").unwrap(), "aYcdf");
    }

    #[test]
    fn test_compose_length_mismatch() {
        let a = Operation::new().retain(3);
        let b = Operation::new().retain(4);
        assert_eq!(
            a.compose(&b).unwrap_err(),
            OtError::LengthMismatch {
                expected: 3,
                actual: 4
            }
        );
    }

    #[test]
    fn test_transform_tie_break() {
        let a = Operation::new().insert("A");
        let b = Operation::new().insert("B");

        let (a_prime, b_prime) = a.transform(&b, TieBreak::Left).unwrap();
        assert_eq!(a_prime.apply(&b.apply("").unwrap()).unwrap(), "AB");
        assert_eq!(b_prime.apply(&a.apply("").unwrap()).unwrap(), "AB");

        let (a_prime, b_prime) = a.transform(&b, TieBreak::Right).unwrap();
        assert_eq!(a_prime.apply(&b.apply("").unwrap()).unwrap(), "BA");
        assert_eq!(b_prime.apply(&a.apply("").unwrap()).unwrap(), "BA");
    }

    #[test]
    fn test_transform_overlapping_deletes() {
        let doc = "abcdef";
        let a = Operation::new().retain(1).delete(3, "bcd").retain(2);
        let b = Operation::new().retain(2).delete(3, "cde").retain(1);

        let (a_prime, b_prime) = a.transform(&b, TieBreak::Left).unwrap();
        let left = a_prime.apply(&b.apply(doc).unwrap()).unwrap();
        let right = b_prime.apply(&a.apply(doc).unwrap()).unwrap();

        assert_eq!(left, "af");
        assert_eq!(left, right);
        assert_eq!(a_prime, Operation::new().retain(1).delete(1, "b").retain(1));
    }

    #[test]
    fn test_transform_insert_inside_deleted_range_survives() {
        let doc = "abcd";
        let a = Operation::new().delete(4, "abcd");
        let b = Operation::new().retain(2).insert("XY").retain(2);

        let (a_prime, b_prime) = a.transform(&b, TieBreak::Left).unwrap();
        let left = a_prime.apply(&b.apply(doc).unwrap()).unwrap();
        let right = b_prime.apply(&a.apply(doc).unwrap()).unwrap();

        assert_eq!(left, "XY");
        assert_eq!(right, "XY");
    }

    #[test]
    fn test_transform_requires_same_base() {
        let a = Operation::new().retain(2);
        let b = Operation::new().retain(3);
        assert!(matches!(
            a.transform(&b, TieBreak::Left),
            Err(OtError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_invert_restores_document() {
        let doc = "hello world";
        let op = Operation::new()
            .delete(1, "h")
            .insert("J")
            .retain(4)
            .delete(6, " world")
            .insert("!");
        let edited = op.apply(doc).unwrap();
        assert_eq!(edited, "Jello!");

        let inverse = op.invert();
        assert_eq!(inverse.apply(&edited).unwrap(), doc);
    }

    #[test]
    fn test_operation_wire_format() {
        let op = Operation::new().retain(2).insert("x").delete(1, "c");
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(json, r#"[{"retain":2},{"insert":"x"},{"delete":1,"removed":"c"}]"#);

        let decoded: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, op);
        assert_eq!(decoded.base_len(), 3);
    }

    #[test]
    fn test_display() {
        let op = Operation::new().retain(1).insert("a");
        assert_eq!(op.to_string(), r#"[retain(1), insert("a")]"#);
    }
}
