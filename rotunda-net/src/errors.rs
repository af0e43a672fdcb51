//! Error types for connection operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetError {
    #[error("Connection closed")]
    Closed,

    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] rotunda_proto::ValidationError),
}

pub type Result<T> = std::result::Result<T, NetError>;
