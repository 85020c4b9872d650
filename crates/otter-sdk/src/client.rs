//! Client-side view of a shared document.
//!
//! A client keeps at most one edit in flight. Edits made while waiting for
//! the acknowledgement are composed into a buffer and sent once the
//! outstanding edit is committed. Remote commits are transformed against the
//! pending edits with the same tie-break the server uses, so the client ends
//! up with exactly the text the server holds once everything is acknowledged.

use crate::error::{Result, SdkError};
use crate::message::{Broadcast, ClientRequest, DocumentSnapshot};
use otter_core::{Operation, TieBreak};
use tracing::trace;

/// Where the client is in the submit/acknowledge cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientState {
    /// Nothing in flight.
    Synchronized,
    /// One edit sent, not yet acknowledged.
    AwaitingAck { outstanding: Operation },
    /// One edit in flight and further local edits waiting behind it.
    AwaitingWithBuffer {
        outstanding: Operation,
        buffer: Operation,
    },
}

/// A client's copy of a document.
#[derive(Clone, Debug)]
pub struct ClientDocument {
    client_id: String,
    version: u64,
    text: String,
    state: ClientState,
}

impl ClientDocument {
    /// Start from the empty document at version 0.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            version: 0,
            text: String::new(),
            state: ClientState::Synchronized,
        }
    }

    /// Start from a server snapshot.
    pub fn from_snapshot(client_id: impl Into<String>, snapshot: DocumentSnapshot) -> Self {
        Self {
            client_id: client_id.into(),
            version: snapshot.version,
            text: snapshot.text,
            state: ClientState::Synchronized,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The last server version this client has incorporated.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Local text, including unacknowledged edits.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// Whether any local edit is still unacknowledged.
    pub fn has_pending(&self) -> bool {
        self.state != ClientState::Synchronized
    }

    /// Apply a local edit.
    ///
    /// Returns the request to send when nothing else is in flight.
    pub fn edit(&mut self, operation: Operation) -> Result<Option<ClientRequest>> {
        let text = operation.apply(&self.text)?;
        let (state, request) = match &self.state {
            ClientState::Synchronized => (
                ClientState::AwaitingAck {
                    outstanding: operation.clone(),
                },
                Some(ClientRequest::new(
                    self.client_id.clone(),
                    self.version,
                    operation,
                )),
            ),
            ClientState::AwaitingAck { outstanding } => (
                ClientState::AwaitingWithBuffer {
                    outstanding: outstanding.clone(),
                    buffer: operation,
                },
                None,
            ),
            ClientState::AwaitingWithBuffer {
                outstanding,
                buffer,
            } => (
                ClientState::AwaitingWithBuffer {
                    outstanding: outstanding.clone(),
                    buffer: buffer.compose(&operation)?,
                },
                None,
            ),
        };

        self.text = text;
        self.state = state;
        Ok(request)
    }

    /// Incorporate a committed operation.
    ///
    /// Broadcasts at or below the current version are ignored. Returns the
    /// buffered edit to send when this broadcast acknowledges the outstanding one.
    pub fn receive(&mut self, broadcast: &Broadcast) -> Result<Option<ClientRequest>> {
        if broadcast.version <= self.version {
            return Ok(None);
        }
        let expected = self.version + 1;
        if broadcast.version != expected {
            return Err(SdkError::OutOfOrder {
                expected,
                found: broadcast.version,
            });
        }

        // With nothing in flight, our own id marks a commit from an earlier
        // session (e.g. replayed after reconnecting), not an acknowledgement.
        if broadcast.client_id == self.client_id && self.has_pending() {
            Ok(self.acknowledge(broadcast.version))
        } else {
            self.apply_remote(broadcast)?;
            Ok(None)
        }
    }

    /// Incorporate a batch of committed operations, such as a history response.
    pub fn catch_up(&mut self, broadcasts: &[Broadcast]) -> Result<Vec<ClientRequest>> {
        let mut requests = Vec::new();
        for broadcast in broadcasts {
            requests.extend(self.receive(broadcast)?);
        }
        Ok(requests)
    }

    fn acknowledge(&mut self, version: u64) -> Option<ClientRequest> {
        let (state, request) = match &self.state {
            ClientState::Synchronized | ClientState::AwaitingAck { .. } => {
                (ClientState::Synchronized, None)
            }
            ClientState::AwaitingWithBuffer { buffer, .. } => (
                ClientState::AwaitingAck {
                    outstanding: buffer.clone(),
                },
                Some(ClientRequest::new(
                    self.client_id.clone(),
                    version,
                    buffer.clone(),
                )),
            ),
        };

        trace!(client = %self.client_id, version, "acknowledged");
        self.version = version;
        self.state = state;
        request
    }

    fn apply_remote(&mut self, broadcast: &Broadcast) -> Result<()> {
        // Pending edits reach the server after this commit, so they lose ties
        // the same way the server's rebase makes them lose.
        let (state, remote) = match &self.state {
            ClientState::Synchronized => (ClientState::Synchronized, broadcast.operation.clone()),
            ClientState::AwaitingAck { outstanding } => {
                let (outstanding, remote) =
                    outstanding.transform(&broadcast.operation, TieBreak::Right)?;
                (ClientState::AwaitingAck { outstanding }, remote)
            }
            ClientState::AwaitingWithBuffer {
                outstanding,
                buffer,
            } => {
                let (outstanding, remote) =
                    outstanding.transform(&broadcast.operation, TieBreak::Right)?;
                let (buffer, remote) = buffer.transform(&remote, TieBreak::Right)?;
                (
                    ClientState::AwaitingWithBuffer {
                        outstanding,
                        buffer,
                    },
                    remote,
                )
            }
        };

        self.text = remote.apply(&self.text)?;
        self.version = broadcast.version;
        self.state = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(version: u64, client_id: &str, operation: Operation) -> Broadcast {
        Broadcast {
            version,
            client_id: client_id.to_string(),
            operation,
        }
    }

    #[test]
    fn test_edit_sends_when_synchronized() {
        let mut client = ClientDocument::new("alice");
        let request = client.edit(Operation::new().insert("hi")).unwrap().unwrap();

        assert_eq!(request.base_version, 0);
        assert_eq!(request.client_id, "alice");
        assert_eq!(client.text(), "hi");
        assert!(client.has_pending());
    }

    #[test]
    fn test_edits_buffer_while_awaiting() {
        let mut client = ClientDocument::new("alice");
        client.edit(Operation::new().insert("a")).unwrap();
        assert!(client.edit(Operation::new().retain(1).insert("b")).unwrap().is_none());
        assert!(client.edit(Operation::new().retain(2).insert("c")).unwrap().is_none());

        assert_eq!(client.text(), "abc");
        match client.state() {
            ClientState::AwaitingWithBuffer { buffer, .. } => {
                assert_eq!(buffer, &Operation::new().retain(1).insert("bc"));
            }
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn test_ack_flushes_buffer() {
        let mut client = ClientDocument::new("alice");
        client.edit(Operation::new().insert("a")).unwrap();
        client.edit(Operation::new().retain(1).insert("b")).unwrap();

        let request = client
            .receive(&remote(1, "alice", Operation::new().insert("a")))
            .unwrap()
            .unwrap();
        assert_eq!(request.base_version, 1);
        assert_eq!(request.operation, Operation::new().retain(1).insert("b"));

        assert!(client
            .receive(&remote(2, "alice", Operation::new().retain(1).insert("b")))
            .unwrap()
            .is_none());
        assert_eq!(client.state(), &ClientState::Synchronized);
        assert_eq!(client.version(), 2);
    }

    #[test]
    fn test_remote_edit_while_awaiting() {
        let mut client = ClientDocument::new("bob");
        client.edit(Operation::new().insert("B")).unwrap();

        // Alice's insert at the same position was committed first.
        client
            .receive(&remote(1, "alice", Operation::new().insert("A")))
            .unwrap();
        assert_eq!(client.text(), "AB");
        assert_eq!(
            client.state(),
            &ClientState::AwaitingAck {
                outstanding: Operation::new().retain(1).insert("B")
            }
        );
    }

    #[test]
    fn test_remote_edit_with_buffer() {
        let mut client = ClientDocument::from_snapshot(
            "bob",
            DocumentSnapshot {
                version: 3,
                text: "xyz".to_string(),
            },
        );
        client.edit(Operation::new().retain(3).insert("1")).unwrap();
        client.edit(Operation::new().retain(4).insert("2")).unwrap();

        client
            .receive(&remote(4, "alice", Operation::new().delete(1, "x").retain(2)))
            .unwrap();
        assert_eq!(client.text(), "yz12");
        assert_eq!(client.version(), 4);
    }

    #[test]
    fn test_stale_and_out_of_order_broadcasts() {
        let mut client = ClientDocument::new("bob");
        client
            .receive(&remote(1, "alice", Operation::new().insert("a")))
            .unwrap();

        // Duplicate is ignored.
        assert!(client
            .receive(&remote(1, "alice", Operation::new().insert("a")))
            .unwrap()
            .is_none());
        assert_eq!(client.text(), "a");

        let err = client
            .receive(&remote(3, "alice", Operation::new().retain(1).insert("c")))
            .unwrap_err();
        assert_eq!(
            err,
            SdkError::OutOfOrder {
                expected: 2,
                found: 3
            }
        );
        assert_eq!(client.version(), 1);
    }

    #[test]
    fn test_failed_edit_leaves_state_untouched() {
        let mut client = ClientDocument::new("bob");
        assert!(client.edit(Operation::new().retain(4)).is_err());
        assert_eq!(client.state(), &ClientState::Synchronized);
        assert_eq!(client.text(), "");
    }

    #[test]
    fn test_reconnect_replays_own_commits() {
        let mut client = ClientDocument::new("alice");
        let requests = client
            .catch_up(&[
                remote(1, "alice", Operation::new().insert("hi")),
                remote(2, "bob", Operation::new().retain(2).insert("!")),
                remote(3, "alice", Operation::new().delete(1, "h").retain(2)),
            ])
            .unwrap();

        assert!(requests.is_empty());
        assert_eq!(client.text(), "i!");
        assert_eq!(client.version(), 3);
        assert_eq!(client.state(), &ClientState::Synchronized);
    }

    #[test]
    fn test_catch_up() {
        let mut client = ClientDocument::new("carol");
        let requests = client
            .catch_up(&[
                remote(1, "alice", Operation::new().insert("ab")),
                remote(2, "bob", Operation::new().retain(2).insert("c")),
            ])
            .unwrap();

        assert!(requests.is_empty());
        assert_eq!(client.text(), "abc");
        assert_eq!(client.version(), 2);
    }
}
