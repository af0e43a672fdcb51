//! Error types for session cache operations.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Actor {0} already cached")]
    DuplicateActor(Uuid),

    #[error("Unknown actor: {0}")]
    UnknownActor(Uuid),

    #[error("Unknown parent actor: {0}")]
    UnknownParent(Uuid),
}

pub type Result<T> = std::result::Result<T, SceneError>;
