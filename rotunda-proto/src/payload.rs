//! Tagged payload sum type and its fieldless discriminant mirror.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::animation::{AnimationState, AnimationStateSample};

/// Outcome code carried by generic operation replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultCode {
    Success,
    Warning,
    Error,
}

/// Application payload, discriminated by its `type` tag on the wire.
///
/// The runtime only inspects the tag and the typed fields below; actor and
/// asset definitions stay opaque `Value` blobs owned by the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Payload {
    /// A freshly connected peer asks to be caught up.
    SyncRequest,

    /// The runtime tells a peer its catch-up is finished.
    SyncComplete,

    /// Link-quality probe; the receiver replies with another heartbeat.
    Heartbeat,

    /// Define an asset (material, texture, mesh) without loading a container.
    CreateAsset {
        definition: Value,
    },

    /// Load an asset container (e.g. a glTF bundle).
    LoadAssets {
        container: Value,
    },

    /// Reply to `create-asset` / `load-assets`.
    AssetsLoaded {
        #[serde(default)]
        assets: Vec<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        failure_message: Option<String>,
    },

    /// Patch a previously loaded asset.
    AssetUpdate {
        asset: Value,
    },

    /// Create an actor in the scene tree.
    CreateActor {
        actor_id: Uuid,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<Uuid>,
        actor: Value,
    },

    /// Create an actor from a host-library resource.
    CreateFromLibrary {
        actor_id: Uuid,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<Uuid>,
        resource_id: String,
        actor: Value,
    },

    /// Reply to the actor-create family.
    ObjectSpawned {
        #[serde(default)]
        actors: Vec<Value>,
        result: ResultCode,
    },

    /// Application-driven patch of a live actor.
    ActorUpdate {
        actor_id: Uuid,
        actor: Value,
    },

    /// Remove actors (and their descendants) from the scene.
    DestroyActors {
        actor_ids: Vec<Uuid>,
    },

    /// Attach a behavior (button, target, ...) to an actor.
    SetBehavior {
        actor_id: Uuid,
        behavior_type: String,
    },

    /// Define a keyframed animation on an actor.
    CreateAnimation {
        actor_id: Uuid,
        animation_id: Uuid,
        animation: Value,
    },

    /// Tween an actor property over a duration.
    InterpolateActor {
        actor_id: Uuid,
        animation_id: Uuid,
        value: Value,
        duration: f64,
        enabled: bool,
    },

    /// Change playback state of an existing animation.
    SetAnimationState {
        actor_id: Uuid,
        animation_id: Uuid,
        state: AnimationState,
    },

    /// Request (empty) or report (populated) live animation playheads.
    SyncAnimations {
        #[serde(default)]
        animation_states: Vec<AnimationStateSample>,
    },

    /// Generic reply for operations without a richer response.
    OperationResult {
        result_code: ResultCode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Diagnostic line forwarded to peers.
    Trace {
        severity: String,
        message: String,
    },

    /// Application-defined event; the runtime treats it as fully opaque.
    AppEvent {
        name: String,
        #[serde(default)]
        data: Value,
    },
}

impl Payload {
    /// The fieldless discriminant used for routing decisions.
    pub fn kind(&self) -> MessageKind {
        match self {
            Payload::SyncRequest => MessageKind::SyncRequest,
            Payload::SyncComplete => MessageKind::SyncComplete,
            Payload::Heartbeat => MessageKind::Heartbeat,
            Payload::CreateAsset { .. } => MessageKind::CreateAsset,
            Payload::LoadAssets { .. } => MessageKind::LoadAssets,
            Payload::AssetsLoaded { .. } => MessageKind::AssetsLoaded,
            Payload::AssetUpdate { .. } => MessageKind::AssetUpdate,
            Payload::CreateActor { .. } => MessageKind::CreateActor,
            Payload::CreateFromLibrary { .. } => MessageKind::CreateFromLibrary,
            Payload::ObjectSpawned { .. } => MessageKind::ObjectSpawned,
            Payload::ActorUpdate { .. } => MessageKind::ActorUpdate,
            Payload::DestroyActors { .. } => MessageKind::DestroyActors,
            Payload::SetBehavior { .. } => MessageKind::SetBehavior,
            Payload::CreateAnimation { .. } => MessageKind::CreateAnimation,
            Payload::InterpolateActor { .. } => MessageKind::InterpolateActor,
            Payload::SetAnimationState { .. } => MessageKind::SetAnimationState,
            Payload::SyncAnimations { .. } => MessageKind::SyncAnimations,
            Payload::OperationResult { .. } => MessageKind::OperationResult,
            Payload::Trace { .. } => MessageKind::Trace,
            Payload::AppEvent { .. } => MessageKind::AppEvent,
        }
    }
}

/// Fieldless mirror of [`Payload`] used as the routing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    SyncRequest,
    SyncComplete,
    Heartbeat,
    CreateAsset,
    LoadAssets,
    AssetsLoaded,
    AssetUpdate,
    CreateActor,
    CreateFromLibrary,
    ObjectSpawned,
    ActorUpdate,
    DestroyActors,
    SetBehavior,
    CreateAnimation,
    InterpolateActor,
    SetAnimationState,
    SyncAnimations,
    OperationResult,
    Trace,
    AppEvent,
}

impl MessageKind {
    /// The wire tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::SyncRequest => "sync-request",
            MessageKind::SyncComplete => "sync-complete",
            MessageKind::Heartbeat => "heartbeat",
            MessageKind::CreateAsset => "create-asset",
            MessageKind::LoadAssets => "load-assets",
            MessageKind::AssetsLoaded => "assets-loaded",
            MessageKind::AssetUpdate => "asset-update",
            MessageKind::CreateActor => "create-actor",
            MessageKind::CreateFromLibrary => "create-from-library",
            MessageKind::ObjectSpawned => "object-spawned",
            MessageKind::ActorUpdate => "actor-update",
            MessageKind::DestroyActors => "destroy-actors",
            MessageKind::SetBehavior => "set-behavior",
            MessageKind::CreateAnimation => "create-animation",
            MessageKind::InterpolateActor => "interpolate-actor",
            MessageKind::SetAnimationState => "set-animation-state",
            MessageKind::SyncAnimations => "sync-animations",
            MessageKind::OperationResult => "operation-result",
            MessageKind::Trace => "trace",
            MessageKind::AppEvent => "app-event",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
