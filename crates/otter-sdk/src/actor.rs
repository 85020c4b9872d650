//! One task per document.
//!
//! A [`DocumentActor`] owns the document's [`ConvergenceController`] and
//! works through its mailbox one command at a time, so reconciliation and
//! compaction never interleave. Callers talk to it through a cloneable
//! [`DocumentHandle`].

use crate::config::ServerConfig;
use crate::controller::ConvergenceController;
use crate::error::{Result, SdkError};
use crate::message::{Broadcast, ClientRequest, DocumentSnapshot};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};

enum Command {
    Submit {
        request: ClientRequest,
        reply: oneshot::Sender<Result<Broadcast>>,
    },
    History {
        since: u64,
        reply: oneshot::Sender<Result<Vec<Broadcast>>>,
    },
    Snapshot {
        reply: oneshot::Sender<DocumentSnapshot>,
    },
    Compress {
        checkpoint: u64,
        reply: oneshot::Sender<Result<usize>>,
    },
}

/// The task that serializes all access to one document.
pub struct DocumentActor {
    controller: ConvergenceController,
    mailbox: mpsc::Receiver<Command>,
    broadcasts: broadcast::Sender<Broadcast>,
}

impl DocumentActor {
    /// Spawn an actor for an empty document on the current runtime.
    pub fn spawn(document_id: impl Into<String>, config: &ServerConfig) -> DocumentHandle {
        let controller =
            ConvergenceController::with_policy(document_id, config.compaction.clone());
        Self::spawn_with(controller, config)
    }

    /// Spawn an actor around an existing controller.
    pub fn spawn_with(controller: ConvergenceController, config: &ServerConfig) -> DocumentHandle {
        let (tx, mailbox) = mpsc::channel(config.mailbox_capacity.max(1));
        let (broadcasts, _) = broadcast::channel(config.broadcast_capacity.max(1));
        let handle = DocumentHandle {
            document_id: controller.document_id().to_string(),
            tx,
            broadcasts: broadcasts.clone(),
        };

        let actor = DocumentActor {
            controller,
            mailbox,
            broadcasts,
        };
        tokio::spawn(actor.run());
        handle
    }

    async fn run(mut self) {
        info!(document = %self.controller.document_id(), "document actor started");
        while let Some(command) = self.mailbox.recv().await {
            self.handle(command);
        }
        info!(
            document = %self.controller.document_id(),
            version = self.controller.version(),
            "document actor stopped"
        );
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Submit { request, reply } => {
                let result = self
                    .controller
                    .apply_operation(&request.client_id, request.base_version, request.operation)
                    .map(|(version, operation)| Broadcast {
                        version,
                        client_id: request.client_id,
                        operation,
                    });
                if let Ok(broadcast) = &result {
                    // No subscribers is fine.
                    let receivers = self.broadcasts.send(broadcast.clone()).unwrap_or(0);
                    debug!(version = broadcast.version, receivers, "broadcast committed operation");
                }
                // The commit stands even if the submitter went away.
                let _ = reply.send(result);
            }
            Command::History { since, reply } => {
                let _ = reply.send(self.controller.history(since));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(DocumentSnapshot {
                    version: self.controller.version(),
                    text: self.controller.document().to_string(),
                });
            }
            Command::Compress { checkpoint, reply } => {
                let _ = reply.send(self.controller.compress_history(checkpoint));
            }
        }
    }
}

/// Cheap, cloneable access to a running document actor.
///
/// The actor stops once every handle is dropped.
#[derive(Clone)]
pub struct DocumentHandle {
    document_id: String,
    tx: mpsc::Sender<Command>,
    broadcasts: broadcast::Sender<Broadcast>,
}

impl DocumentHandle {
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Receive every operation committed from now on, in version order.
    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.broadcasts.subscribe()
    }

    /// Submit an edit; resolves to the committed form once reconciled.
    pub async fn submit(&self, request: ClientRequest) -> Result<Broadcast> {
        self.request(|reply| Command::Submit { request, reply })
            .await?
    }

    /// Everything committed after `since`.
    pub async fn history(&self, since: u64) -> Result<Vec<Broadcast>> {
        self.request(|reply| Command::History { since, reply })
            .await?
    }

    /// The current version and text.
    pub async fn snapshot(&self) -> Result<DocumentSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Fold history up to `checkpoint` into one entry.
    pub async fn compress(&self, checkpoint: u64) -> Result<usize> {
        self.request(|reply| Command::Compress { checkpoint, reply })
            .await?
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| SdkError::DocumentClosed(self.document_id.clone()))?;
        response
            .await
            .map_err(|_| SdkError::DocumentClosed(self.document_id.clone()))
    }
}

impl std::fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("document_id", &self.document_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
