//! Classifies and dispatches outbound messages for one peer.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use rotunda_net::Connection;
use rotunda_proto::{Envelope, MessageKind};

use crate::errors::{Result, SyncError};
use crate::queue::{OutboundQueue, QueuedMessage, ReplySender};
use crate::rules::{self, Handling};
use crate::stage::{Stage, StageTracker};

/// Message router for one syncing peer.
///
/// Owns the peer's stage tracker and outbound queue. Every outbound
/// application message passes through [`Router::send`], which consults the
/// rule table against the current stage state and forwards, defers, drops,
/// or rejects the message.
pub struct Router {
    peer_id: uuid::Uuid,
    conn: Arc<dyn Connection>,
    stages: StageTracker,
    queue: OutboundQueue,
    warned: HashSet<MessageKind>,
    /// Application-facing channel that mirrors replies while this peer is
    /// the authoritative peer mid-sync (the application is awaiting them).
    echo: Option<mpsc::UnboundedSender<Envelope>>,
    pending: Vec<JoinHandle<Result<()>>>,
}

impl Router {
    pub fn new(peer_id: uuid::Uuid, conn: Arc<dyn Connection>) -> Self {
        Self {
            peer_id,
            conn,
            stages: StageTracker::new(),
            queue: OutboundQueue::new(),
            warned: HashSet::new(),
            echo: None,
            pending: Vec::new(),
        }
    }

    /// Mirror replies of forwarded requests onto an application-facing
    /// channel. Only used while the peer is flagged authoritative mid-sync.
    pub fn with_reply_echo(mut self, echo: mpsc::UnboundedSender<Envelope>) -> Self {
        self.echo = Some(echo);
        self
    }

    pub fn begin_stage(&mut self, stage: Stage) {
        self.stages.begin(stage);
    }

    pub fn complete_stage(&mut self, stage: Stage) {
        self.stages.complete(stage);
    }

    pub fn stages(&self) -> &StageTracker {
        &self.stages
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Classify one message kind against the current stage state.
    pub fn route(&mut self, kind: MessageKind) -> Handling {
        let rule = match rules::rule_for(kind) {
            Some(rule) => rule,
            None => {
                if self.warned.insert(kind) {
                    warn!(
                        "No rule for message kind {}; deferring until sync completes",
                        kind
                    );
                }
                rules::DEFAULT_RULE
            }
        };
        rule.handling(&self.stages)
    }

    /// Route and dispatch one outbound message.
    pub async fn send(&mut self, envelope: Envelope, reply: Option<ReplySender>) -> Result<()> {
        let kind = envelope.kind();
        match self.route(kind) {
            Handling::Allow => self.dispatch(envelope, reply).await,
            Handling::Queue => {
                debug!("Queueing {} for peer {}", kind, self.peer_id);
                self.queue.push(QueuedMessage { envelope, reply });
                Ok(())
            }
            Handling::Ignore => {
                if let Some(reply) = reply {
                    warn!(
                        "Ignoring {} for peer {} despite an awaited reply; resolving empty",
                        kind, self.peer_id
                    );
                    let _ = reply.send(Ok(None));
                } else {
                    debug!("Ignoring {} for peer {}", kind, self.peer_id);
                }
                Ok(())
            }
            Handling::Error => {
                error!(
                    "Illegal message {} for peer {} ({})",
                    kind,
                    self.peer_id,
                    self.stages.describe()
                );
                if let Some(reply) = reply {
                    let _ = reply.send(Err(SyncError::Protocol(format!(
                        "message {} is illegal in the peer's current sync phase",
                        kind
                    ))));
                }
                Ok(())
            }
        }
    }

    async fn dispatch(&mut self, envelope: Envelope, reply: Option<ReplySender>) -> Result<()> {
        match reply {
            None => Ok(self.conn.send(envelope).await?),
            Some(reply_tx) => {
                let conn = self.conn.clone();
                let echo = self.echo.clone();
                let handle = tokio::spawn(async move {
                    match conn.request(envelope).await {
                        Ok(response) => {
                            if let Some(echo) = echo {
                                let _ = echo.send(response.clone());
                            }
                            let _ = reply_tx.send(Ok(Some(response)));
                            Ok(())
                        }
                        Err(e) => {
                            let reason = e.to_string();
                            let _ = reply_tx.send(Err(SyncError::ReplyFailed(reason.clone())));
                            Err(SyncError::ReplyFailed(reason))
                        }
                    }
                });
                self.pending.push(handle);
                Ok(())
            }
        }
    }

    /// Await every reply dispatched so far, propagating the first failure.
    pub async fn join_pending(&mut self) -> Result<()> {
        for handle in self.pending.drain(..) {
            handle
                .await
                .map_err(|e| SyncError::TaskFailed(e.to_string()))??;
        }
        Ok(())
    }

    /// Remove queued messages whose classification has become `allow`,
    /// in queue order.
    pub fn take_sendable(&mut self) -> Vec<QueuedMessage> {
        let stages = &self.stages;
        self.queue
            .filter(|m| rules::rule_or_default(m.envelope.kind()).handling(stages) == Handling::Allow)
    }

    /// Reject everything still queued (peer gone or sync failed).
    pub fn fail_queue(&mut self, reason: &str) {
        if !self.queue.is_empty() {
            warn!(
                "Dropping {} queued messages for peer {}: {}",
                self.queue.len(),
                self.peer_id,
                reason
            );
        }
        self.queue.reject_all(reason);
    }
}
