//! Animation playback state as exchanged between peers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Playback state of one animation.
///
/// `time` is the playhead in seconds; the reconciler rewrites it before
/// forwarding samples to a joining peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationState {
    pub time: f64,
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

fn default_speed() -> f64 {
    1.0
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            time: 0.0,
            speed: 1.0,
            enabled: None,
        }
    }
}

/// One animation's state as reported by the authoritative peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationStateSample {
    pub animation_id: Uuid,
    pub state: AnimationState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_defaults_to_one() {
        let state: AnimationState = serde_json::from_str(r#"{"time": 4.5}"#).unwrap();
        assert_eq!(state.time, 4.5);
        assert_eq!(state.speed, 1.0);
        assert!(state.enabled.is_none());
    }
}
