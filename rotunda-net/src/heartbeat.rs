//! Round-trip calibration over heartbeat messages.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use rotunda_proto::{Envelope, Payload};

use crate::connection::Connection;
use crate::errors::Result;

/// Measure the link's round trip with a burst of heartbeat exchanges.
///
/// Sends `burst` heartbeats back to back, awaiting each reply, and stores the
/// mean round-trip on the connection's quality. A burst of zero leaves the
/// currently reported latency untouched (useful when the embedding already
/// knows the link quality).
pub async fn calibrate(conn: &dyn Connection, burst: usize) -> Result<f64> {
    if burst == 0 {
        return Ok(conn.quality().latency_ms);
    }

    let mut total = Duration::ZERO;
    for round in 0..burst {
        let started = Instant::now();
        conn.request(Envelope::new(Payload::Heartbeat)).await?;
        let elapsed = started.elapsed();
        debug!("Heartbeat round {} took {:?}", round, elapsed);
        total += elapsed;
    }

    let mean_ms = total.as_secs_f64() * 1000.0 / burst as f64;
    conn.set_latency(mean_ms);
    info!("Calibrated link latency: {:.3} ms over {} rounds", mean_ms, burst);
    Ok(mean_ms)
}
