//! Registry of live documents.

use crate::actor::{DocumentActor, DocumentHandle};
use crate::config::ServerConfig;
use crate::error::SdkError;
use crate::message::Message;
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Events emitted by a hub.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HubEvent {
    /// A document actor was started.
    DocumentOpened { document_id: String },
    /// A document was removed from the hub.
    DocumentClosed { document_id: String },
}

/// Owns one actor per document id and routes wire messages to them.
///
/// Documents are independent: edits to one never wait on another.
pub struct DocumentHub {
    config: ServerConfig,
    documents: RwLock<HashMap<String, DocumentHandle>>,
    event_tx: broadcast::Sender<HubEvent>,
}

impl DocumentHub {
    /// Create a hub. Must be used from within a tokio runtime.
    pub fn new(config: ServerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            config,
            documents: RwLock::new(HashMap::new()),
            event_tx,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Subscribe to hub events.
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.event_tx.subscribe()
    }

    /// Get the handle for a document, starting its actor on first use.
    pub fn open(&self, document_id: &str) -> DocumentHandle {
        if let Some(handle) = self.documents.read().get(document_id) {
            return handle.clone();
        }

        let mut documents = self.documents.write();
        // Someone may have opened it between the two locks.
        if let Some(handle) = documents.get(document_id) {
            return handle.clone();
        }
        let handle = DocumentActor::spawn(document_id, &self.config);
        documents.insert(document_id.to_string(), handle.clone());
        drop(documents);

        info!(document = document_id, "opened document");
        let _ = self.event_tx.send(HubEvent::DocumentOpened {
            document_id: document_id.to_string(),
        });
        handle
    }

    /// Get the handle for a document that is already open.
    pub fn get(&self, document_id: &str) -> Option<DocumentHandle> {
        self.documents.read().get(document_id).cloned()
    }

    /// Remove a document. Its actor stops once outstanding handles are dropped.
    pub fn close(&self, document_id: &str) -> bool {
        let removed = self.documents.write().remove(document_id).is_some();
        if removed {
            info!(document = document_id, "closed document");
            let _ = self.event_tx.send(HubEvent::DocumentClosed {
                document_id: document_id.to_string(),
            });
        }
        removed
    }

    /// Ids of all open documents.
    pub fn documents(&self) -> Vec<String> {
        self.documents.read().keys().cloned().collect()
    }

    /// Answer a client message.
    ///
    /// Submissions are answered with the committed broadcast, history requests
    /// with the entries since the requested version, and anything a client
    /// should not send with an error.
    pub async fn handle(&self, message: Message) -> Message {
        match message {
            Message::Submit {
                document_id,
                request,
            } => {
                debug!(document = %document_id, client = %request.client_id, "submit");
                match self.open(&document_id).submit(request).await {
                    Ok(broadcast) => Message::Broadcast {
                        document_id,
                        broadcast,
                    },
                    Err(err) => Message::error(&err),
                }
            }
            Message::HistoryRequest {
                document_id,
                since_version,
            } => {
                // Queries never open documents; an unopened one is empty at version 0.
                let result = match self.get(&document_id) {
                    Some(handle) => handle.history(since_version).await,
                    None if since_version == 0 => Ok(Vec::new()),
                    None => Err(SdkError::FutureBaseVersion {
                        base: since_version,
                        current: 0,
                    }),
                };
                match result {
                    Ok(entries) => Message::History {
                        document_id,
                        entries,
                    },
                    Err(err) => Message::error(&err),
                }
            }
            other => Message::error(&SdkError::UnexpectedMessage(format!("{:?}", other))),
        }
    }

    /// Decode, answer and encode a JSON message.
    pub async fn handle_json(&self, json: &str) -> String {
        let response = match Message::from_json(json) {
            Ok(message) => self.handle(message).await,
            Err(err) => Message::error(&err),
        };
        // Responses are plain data and always encode.
        response
            .to_json()
            .unwrap_or_else(|err| format!(r#"{{"type":"error","code":"{}"}}"#, err.code()))
    }
}

impl Default for DocumentHub {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}
