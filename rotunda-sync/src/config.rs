//! Configuration for the sync protocol.

/// Tunables for one peer's sync.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Heartbeat round-trips used to calibrate link latency before the
    /// staged replay begins. Zero skips calibration and keeps whatever
    /// latency the connection already reports.
    pub heartbeat_burst: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { heartbeat_burst: 10 }
    }
}
