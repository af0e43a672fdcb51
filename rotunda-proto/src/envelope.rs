//! Message envelope with reply correlation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::payload::{MessageKind, Payload};

/// One unit of application traffic.
///
/// Replies carry the originating envelope's id in `reply_to_id`; everything
/// else about correlation lives in the connection layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<Uuid>,
    pub payload: Payload,
}

impl Envelope {
    /// Wrap a payload in a fresh envelope.
    pub fn new(payload: Payload) -> Self {
        Self {
            id: Uuid::new_v4(),
            reply_to_id: None,
            payload,
        }
    }

    /// Build a reply to this envelope.
    pub fn reply(&self, payload: Payload) -> Self {
        Self {
            id: Uuid::new_v4(),
            reply_to_id: Some(self.id),
            payload,
        }
    }

    /// Re-issue a cached payload under a fresh id, so the replayed copy gets
    /// its own reply correlation.
    pub fn reissue(&self) -> Self {
        Self::new(self.payload.clone())
    }

    /// The routing discriminant of the carried payload.
    pub fn kind(&self) -> MessageKind {
        self.payload.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_links_back_to_request() {
        let request = Envelope::new(Payload::Heartbeat);
        let reply = request.reply(Payload::Heartbeat);

        assert_eq!(reply.reply_to_id, Some(request.id));
        assert_ne!(reply.id, request.id);
    }

    #[test]
    fn test_reissue_gets_fresh_id() {
        let original = Envelope::new(Payload::SyncRequest);
        let replayed = original.reissue();

        assert_ne!(replayed.id, original.id);
        assert_eq!(replayed.kind(), MessageKind::SyncRequest);
        assert!(replayed.reply_to_id.is_none());
    }

    #[test]
    fn test_envelope_json_round_trip() {
        let envelope = Envelope::new(Payload::Trace {
            severity: "info".to_string(),
            message: "hello".to_string(),
        });

        let bytes = serde_json::to_vec(&envelope).unwrap();
        let decoded: Envelope = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(decoded.id, envelope.id);
        assert_eq!(decoded.kind(), MessageKind::Trace);
    }
}
