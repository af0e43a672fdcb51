//! A joined peer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use rotunda_net::Connection;

/// A remote participant rendering the shared scene.
///
/// `order` is the monotone join index; the peer with the lowest order in a
/// session is the authoritative peer.
#[derive(Clone)]
pub struct Peer {
    pub id: Uuid,
    pub order: u32,
    pub conn: Arc<dyn Connection>,
    pub authoritative: bool,
    pub joined_at: DateTime<Utc>,
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.id)
            .field("order", &self.order)
            .field("authoritative", &self.authoritative)
            .field("joined_at", &self.joined_at)
            .finish()
    }
}
