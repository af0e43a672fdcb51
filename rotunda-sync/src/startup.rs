//! Startup protocol: sync-request handshake and link calibration.

use std::sync::Arc;

use tracing::{debug, info};

use rotunda_net::{heartbeat, Connection};
use rotunda_proto::Payload;

use crate::config::SyncConfig;
use crate::errors::Result;

/// Wait for the peer's `sync-request`, then calibrate the link.
///
/// Returns the measured round-trip latency in milliseconds. Inbound
/// heartbeats are answered while waiting; everything else the peer sends
/// before requesting sync is dropped with a note. Failures propagate and
/// the caller drops the peer.
pub async fn handshake(conn: &Arc<dyn Connection>, config: &SyncConfig) -> Result<f64> {
    debug!("Waiting for sync-request");
    loop {
        let envelope = conn.recv().await?;
        match envelope.payload {
            Payload::SyncRequest => break,
            Payload::Heartbeat => {
                conn.send(envelope.reply(Payload::Heartbeat)).await?;
            }
            _ => debug!(
                "Ignoring {} received before sync-request",
                envelope.kind()
            ),
        }
    }
    info!("Received sync-request; calibrating link");

    let latency_ms = heartbeat::calibrate(conn.as_ref(), config.heartbeat_burst).await?;
    Ok(latency_ms)
}
