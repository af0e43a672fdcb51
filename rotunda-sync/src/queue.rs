//! Per-peer outbound queue of deferred messages.

use std::collections::VecDeque;

use tokio::sync::oneshot;

use rotunda_proto::Envelope;

use crate::errors::{Result, SyncError};

/// Continuation resumed when a deferred message's reply arrives.
///
/// Resolves to `Ok(None)` when the message was deliberately dropped without
/// a reply (the `ignore` handling), so callers never hang.
pub type ReplySender = oneshot::Sender<Result<Option<Envelope>>>;

/// One deferred message and its reply continuation.
#[derive(Debug)]
pub struct QueuedMessage {
    pub envelope: Envelope,
    pub reply: Option<ReplySender>,
}

/// FIFO queue of messages waiting for a stage transition.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    items: VecDeque<QueuedMessage>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: QueuedMessage) {
        self.items.push_back(message);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove and return every message matching the predicate, preserving
    /// queue order both in the result and among the survivors.
    pub fn filter(&mut self, mut predicate: impl FnMut(&QueuedMessage) -> bool) -> Vec<QueuedMessage> {
        let mut taken = Vec::new();
        let mut kept = VecDeque::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            if predicate(&item) {
                taken.push(item);
            } else {
                kept.push_back(item);
            }
        }
        self.items = kept;
        taken
    }

    /// Drop every queued message, rejecting its reply continuation.
    pub fn reject_all(&mut self, reason: &str) {
        for item in self.items.drain(..) {
            if let Some(reply) = item.reply {
                let _ = reply.send(Err(SyncError::Disconnected(reason.to_string())));
            }
        }
    }
}
