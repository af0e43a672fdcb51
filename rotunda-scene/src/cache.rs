//! The session cache proper.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, trace};
use uuid::Uuid;

use rotunda_proto::{Envelope, Payload};

use crate::errors::{Result, SceneError};

/// Everything remembered about one created actor.
#[derive(Debug, Clone)]
pub struct CachedActor {
    pub actor_id: Uuid,
    pub parent_id: Option<Uuid>,
    /// The create message to replay for a joining peer.
    pub message: Envelope,
    /// Animations defined on this actor, in creation order.
    pub created_animations: Vec<Envelope>,
    /// Interpolations started on this actor, in start order.
    pub active_interpolations: Vec<Envelope>,
    /// Behavior type attached to this actor, if any.
    pub behavior: Option<String>,
}

#[derive(Default)]
struct Store {
    assets: Vec<Envelope>,
    asset_updates: Vec<Envelope>,
    actor_order: Vec<Uuid>,
    actors: HashMap<Uuid, CachedActor>,
}

/// Append-only cache of the messages that built the current scene.
///
/// Shared as `Arc<SceneCache>`; the application appends, sync drivers read
/// snapshots.
#[derive(Default)]
pub struct SceneCache {
    store: RwLock<Store>,
}

impl SceneCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a message under the cache, if it is state-bearing.
    ///
    /// Messages that carry no durable scene state (heartbeats, traces,
    /// updates to live actors) are ignored.
    pub async fn record(&self, envelope: &Envelope) -> Result<()> {
        let mut store = self.store.write().await;
        match &envelope.payload {
            Payload::CreateAsset { .. } | Payload::LoadAssets { .. } => {
                store.assets.push(envelope.clone());
            }
            Payload::AssetUpdate { .. } => {
                store.asset_updates.push(envelope.clone());
            }
            Payload::CreateActor {
                actor_id,
                parent_id,
                ..
            }
            | Payload::CreateFromLibrary {
                actor_id,
                parent_id,
                ..
            } => {
                if store.actors.contains_key(actor_id) {
                    return Err(SceneError::DuplicateActor(*actor_id));
                }
                if let Some(parent_id) = parent_id {
                    if !store.actors.contains_key(parent_id) {
                        return Err(SceneError::UnknownParent(*parent_id));
                    }
                }
                store.actor_order.push(*actor_id);
                store.actors.insert(
                    *actor_id,
                    CachedActor {
                        actor_id: *actor_id,
                        parent_id: *parent_id,
                        message: envelope.clone(),
                        created_animations: Vec::new(),
                        active_interpolations: Vec::new(),
                        behavior: None,
                    },
                );
                debug!("Cached actor {} (parent: {:?})", actor_id, parent_id);
            }
            Payload::CreateAnimation { actor_id, .. } => {
                let actor = store
                    .actors
                    .get_mut(actor_id)
                    .ok_or(SceneError::UnknownActor(*actor_id))?;
                actor.created_animations.push(envelope.clone());
            }
            Payload::InterpolateActor { actor_id, .. } => {
                let actor = store
                    .actors
                    .get_mut(actor_id)
                    .ok_or(SceneError::UnknownActor(*actor_id))?;
                actor.active_interpolations.push(envelope.clone());
            }
            Payload::SetBehavior {
                actor_id,
                behavior_type,
            } => {
                let actor = store
                    .actors
                    .get_mut(actor_id)
                    .ok_or(SceneError::UnknownActor(*actor_id))?;
                actor.behavior = Some(behavior_type.clone());
            }
            Payload::DestroyActors { actor_ids } => {
                for actor_id in actor_ids {
                    Self::remove_subtree(&mut store, *actor_id);
                }
            }
            _ => {
                trace!("Not cacheable: {}", envelope.kind());
            }
        }
        Ok(())
    }

    fn remove_subtree(store: &mut Store, actor_id: Uuid) {
        let mut doomed = vec![actor_id];
        let mut index = 0;
        while index < doomed.len() {
            let parent = doomed[index];
            for actor in store.actors.values() {
                if actor.parent_id == Some(parent) {
                    doomed.push(actor.actor_id);
                }
            }
            index += 1;
        }
        for actor_id in doomed {
            store.actors.remove(&actor_id);
            store.actor_order.retain(|id| *id != actor_id);
        }
    }

    /// Cached load-asset messages, in send order.
    pub async fn assets(&self) -> Vec<Envelope> {
        self.store.read().await.assets.clone()
    }

    /// Cached asset-update messages, in send order.
    pub async fn asset_updates(&self) -> Vec<Envelope> {
        self.store.read().await.asset_updates.clone()
    }

    /// All cached actors, in creation order.
    pub async fn actors(&self) -> Vec<CachedActor> {
        let store = self.store.read().await;
        store
            .actor_order
            .iter()
            .filter_map(|id| store.actors.get(id).cloned())
            .collect()
    }

    /// Cached actors with no parent, in creation order.
    pub async fn root_actors(&self) -> Vec<CachedActor> {
        self.actors()
            .await
            .into_iter()
            .filter(|actor| actor.parent_id.is_none())
            .collect()
    }

    /// Direct children of an actor, in creation order.
    pub async fn children_of(&self, actor_id: Uuid) -> Vec<CachedActor> {
        self.actors()
            .await
            .into_iter()
            .filter(|actor| actor.parent_id == Some(actor_id))
            .collect()
    }

    /// One cached actor by id.
    pub async fn get(&self, actor_id: Uuid) -> Option<CachedActor> {
        self.store.read().await.actors.get(&actor_id).cloned()
    }
}
