//! Input validation and size limits for protocol messages.

use thiserror::Error;

use crate::envelope::Envelope;
use crate::payload::Payload;

/// Maximum size limits for protocol messages and data.
pub mod limits {
    /// Maximum size for a single encoded envelope (1 MB).
    pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

    /// Maximum length for a behavior type name.
    pub const MAX_BEHAVIOR_TYPE_LENGTH: usize = 64;

    /// Maximum length for a trace line.
    pub const MAX_TRACE_LENGTH: usize = 4096;

    /// Maximum length for an application event name.
    pub const MAX_EVENT_NAME_LENGTH: usize = 256;

    /// Maximum number of actors destroyed by one message.
    pub const MAX_DESTROY_BATCH: usize = 10_000;

    /// Maximum number of animation states in one sync-animations payload.
    pub const MAX_ANIMATION_STATES: usize = 10_000;
}

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Message size {size} exceeds maximum {max}")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Behavior type length {length} exceeds maximum {max}")]
    BehaviorTypeTooLong { length: usize, max: usize },

    #[error("Trace length {length} exceeds maximum {max}")]
    TraceTooLong { length: usize, max: usize },

    #[error("Event name length {length} exceeds maximum {max}")]
    EventNameTooLong { length: usize, max: usize },

    #[error("Destroy batch of {count} actors exceeds maximum {max}")]
    DestroyBatchTooLarge { count: usize, max: usize },

    #[error("{count} animation states exceeds maximum {max}")]
    TooManyAnimationStates { count: usize, max: usize },
}

/// Validate an encoded message size.
pub fn validate_message_size(size: usize) -> Result<(), ValidationError> {
    if size > limits::MAX_MESSAGE_SIZE {
        return Err(ValidationError::MessageTooLarge {
            size,
            max: limits::MAX_MESSAGE_SIZE,
        });
    }
    Ok(())
}

/// Validate the typed fields of an envelope before it is sent.
pub fn validate_envelope(envelope: &Envelope) -> Result<(), ValidationError> {
    match &envelope.payload {
        Payload::SetBehavior { behavior_type, .. } => {
            if behavior_type.len() > limits::MAX_BEHAVIOR_TYPE_LENGTH {
                return Err(ValidationError::BehaviorTypeTooLong {
                    length: behavior_type.len(),
                    max: limits::MAX_BEHAVIOR_TYPE_LENGTH,
                });
            }
        }
        Payload::Trace { message, .. } => {
            if message.len() > limits::MAX_TRACE_LENGTH {
                return Err(ValidationError::TraceTooLong {
                    length: message.len(),
                    max: limits::MAX_TRACE_LENGTH,
                });
            }
        }
        Payload::AppEvent { name, .. } => {
            if name.len() > limits::MAX_EVENT_NAME_LENGTH {
                return Err(ValidationError::EventNameTooLong {
                    length: name.len(),
                    max: limits::MAX_EVENT_NAME_LENGTH,
                });
            }
        }
        Payload::DestroyActors { actor_ids } => {
            if actor_ids.len() > limits::MAX_DESTROY_BATCH {
                return Err(ValidationError::DestroyBatchTooLarge {
                    count: actor_ids.len(),
                    max: limits::MAX_DESTROY_BATCH,
                });
            }
        }
        Payload::SyncAnimations { animation_states } => {
            if animation_states.len() > limits::MAX_ANIMATION_STATES {
                return Err(ValidationError::TooManyAnimationStates {
                    count: animation_states.len(),
                    max: limits::MAX_ANIMATION_STATES,
                });
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_message_size_limit() {
        assert!(validate_message_size(limits::MAX_MESSAGE_SIZE).is_ok());
        assert!(validate_message_size(limits::MAX_MESSAGE_SIZE + 1).is_err());
    }

    #[test]
    fn test_behavior_type_limit() {
        let ok = Envelope::new(Payload::SetBehavior {
            actor_id: Uuid::new_v4(),
            behavior_type: "button".to_string(),
        });
        assert!(validate_envelope(&ok).is_ok());

        let too_long = Envelope::new(Payload::SetBehavior {
            actor_id: Uuid::new_v4(),
            behavior_type: "b".repeat(limits::MAX_BEHAVIOR_TYPE_LENGTH + 1),
        });
        assert!(matches!(
            validate_envelope(&too_long),
            Err(ValidationError::BehaviorTypeTooLong { .. })
        ));
    }
}
