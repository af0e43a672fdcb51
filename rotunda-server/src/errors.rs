//! Error types for session operations.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Sync error: {0}")]
    Sync(#[from] rotunda_sync::SyncError),

    #[error("Connection error: {0}")]
    Net(#[from] rotunda_net::NetError),

    #[error("Scene cache error: {0}")]
    Scene(#[from] rotunda_scene::SceneError),

    #[error("Unknown peer: {0}")]
    UnknownPeer(Uuid),
}

pub type Result<T> = std::result::Result<T, ServerError>;
