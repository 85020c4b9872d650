//! Wire messages exchanged between clients and the server.
//!
//! All messages are camelCase JSON. A committed operation is sent to every
//! client as a [`Broadcast`], which is also the element type of history
//! (catch-up) responses.

use crate::error::{Result, SdkError};
use otter_core::Operation;
use otter_history::HistoryEntry;
use serde::{Deserialize, Serialize};

/// An edit submitted by a client, anchored at the last version it has seen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRequest {
    pub client_id: String,
    pub base_version: u64,
    pub operation: Operation,
}

impl ClientRequest {
    pub fn new(client_id: impl Into<String>, base_version: u64, operation: Operation) -> Self {
        Self {
            client_id: client_id.into(),
            base_version,
            operation,
        }
    }
}

/// A committed, already-transformed operation.
///
/// Safe to apply on any client at version `version - 1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Broadcast {
    pub version: u64,
    pub client_id: String,
    pub operation: Operation,
}

impl From<&HistoryEntry> for Broadcast {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            version: entry.version,
            client_id: entry.client_id.clone(),
            operation: entry.operation.clone(),
        }
    }
}

/// A document's text at a version, for (re)initialising a client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub version: u64,
    pub text: String,
}

/// Envelope for everything sent over a transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    /// Client -> server: submit an edit.
    #[serde(rename_all = "camelCase")]
    Submit {
        document_id: String,
        request: ClientRequest,
    },
    /// Server -> clients: an edit was committed.
    #[serde(rename_all = "camelCase")]
    Broadcast {
        document_id: String,
        broadcast: Broadcast,
    },
    /// Client -> server: fetch everything committed after a version.
    #[serde(rename_all = "camelCase")]
    HistoryRequest {
        document_id: String,
        since_version: u64,
    },
    /// Server -> client: catch-up response.
    #[serde(rename_all = "camelCase")]
    History {
        document_id: String,
        entries: Vec<Broadcast>,
    },
    /// Server -> client: the request was rejected.
    Error { code: String, message: String },
}

impl Message {
    pub fn error(err: &SdkError) -> Self {
        Message::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_request_wire_format() {
        let request = ClientRequest::new("alice", 3, Operation::new().retain(2).insert("x"));
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "clientId": "alice",
                "baseVersion": 3,
                "operation": [{"retain": 2}, {"insert": "x"}]
            })
        );
    }

    #[test]
    fn test_broadcast_wire_format() {
        let broadcast = Broadcast {
            version: 4,
            client_id: "bob".to_string(),
            operation: Operation::new().delete(1, "a"),
        };
        let value = serde_json::to_value(&broadcast).unwrap();

        assert_eq!(
            value,
            json!({
                "version": 4,
                "clientId": "bob",
                "operation": [{"delete": 1, "removed": "a"}]
            })
        );
    }

    #[test]
    fn test_message_envelope() {
        let json = r#"{"type":"historyRequest","documentId":"doc","sinceVersion":2}"#;
        let message = Message::from_json(json).unwrap();

        assert_eq!(
            message,
            Message::HistoryRequest {
                document_id: "doc".to_string(),
                since_version: 2,
            }
        );
        assert_eq!(message.to_json().unwrap(), json);
    }

    #[test]
    fn test_error_message() {
        let err = SdkError::FutureBaseVersion {
            base: 9,
            current: 2,
        };
        match Message::error(&err) {
            Message::Error { code, message } => {
                assert_eq!(code, "FutureBaseVersion");
                assert!(message.contains('9'));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_operation_is_rejected() {
        let json = r#"{"type":"submit","documentId":"doc","request":{"clientId":"a","baseVersion":0,"operation":[{"retain":0}]}}"#;
        assert!(Message::from_json(json).is_err());
    }
}
