//! Error types for sync operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Connection error: {0}")]
    Net(#[from] rotunda_net::NetError),

    #[error("Authoritative peer unavailable: {0}")]
    AuthoritativeUnavailable(String),

    #[error("Peer disconnected: {0}")]
    Disconnected(String),

    #[error("Awaited reply failed: {0}")]
    ReplyFailed(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Sync task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
