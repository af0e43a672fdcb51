//! The connection contract consumed by the sync core.

use async_trait::async_trait;

use rotunda_proto::Envelope;

use crate::errors::Result;

/// Link quality as reported by the transport.
///
/// `latency_ms` is the round-trip estimate in milliseconds, refreshed by the
/// startup heartbeat calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionQuality {
    pub latency_ms: f64,
}

impl Default for ConnectionQuality {
    fn default() -> Self {
        Self { latency_ms: 0.0 }
    }
}

/// An ordered, reply-correlated channel to one peer.
///
/// Implementations must preserve FIFO send order. `request` registers a reply
/// slot before the envelope leaves, so a reply can never race its request.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Send an envelope without waiting for a reply.
    async fn send(&self, envelope: Envelope) -> Result<()>;

    /// Send an envelope and await the reply correlated to its id.
    async fn request(&self, envelope: Envelope) -> Result<Envelope>;

    /// Receive the next inbound envelope that is not a correlated reply.
    async fn recv(&self) -> Result<Envelope>;

    /// Current link quality.
    fn quality(&self) -> ConnectionQuality;

    /// Record a measured round-trip latency.
    fn set_latency(&self, latency_ms: f64);

    /// Close the connection; pending replies are rejected.
    fn close(&self);

    /// Whether the connection has been closed (locally or by the peer).
    fn is_closed(&self) -> bool;
}
