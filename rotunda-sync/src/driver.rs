//! Orchestrates the staged catch-up of one joining peer.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info};

use rotunda_net::Connection;
use rotunda_proto::{Envelope, Payload};
use rotunda_scene::{CachedActor, SceneCache};

use crate::errors::{Result, SyncError};
use crate::reconcile;
use crate::router::Router;
use crate::stage::Stage;
use crate::stats::SyncStats;

/// What the driver needs to know about the session it is syncing into.
pub struct SyncContext {
    /// The session cache to replay.
    pub cache: Arc<SceneCache>,
    /// Whether peers carry authoritative state (staged replay enabled). In
    /// single-authority sessions only the wrapper stage runs.
    pub peer_authoritative: bool,
    /// Link to the current authoritative peer, when one exists and it is not
    /// the joining peer itself.
    pub authoritative: Option<Arc<dyn Connection>>,
}

/// Drives one peer through the catch-up sequence.
///
/// The driver owns the peer's sync: it steps the stage tracker, replays the
/// cache, drains the outbound queue between stages, and emits the single
/// `sync-complete`. Any failure rejects the whole sync; the peer is then
/// treated as never having joined.
pub struct SyncDriver {
    peer_id: uuid::Uuid,
    conn: Arc<dyn Connection>,
    router: Arc<Mutex<Router>>,
    ctx: SyncContext,
    /// Whether the joining peer itself becomes the authoritative peer.
    is_authoritative: bool,
    stats: SyncStats,
}

impl SyncDriver {
    pub fn new(
        peer_id: uuid::Uuid,
        conn: Arc<dyn Connection>,
        router: Arc<Mutex<Router>>,
        ctx: SyncContext,
        is_authoritative: bool,
    ) -> Self {
        Self {
            peer_id,
            conn,
            router,
            ctx,
            is_authoritative,
            stats: SyncStats::default(),
        }
    }

    /// Run the sync to completion.
    pub async fn run(mut self) -> Result<SyncStats> {
        info!(
            "Starting sync for peer {} (authoritative: {})",
            self.peer_id, self.is_authoritative
        );
        self.router.lock().await.begin_stage(Stage::Always);

        if let Err(e) = self.replay().await {
            self.router.lock().await.fail_queue("sync failed");
            return Err(e);
        }

        self.router.lock().await.complete_stage(Stage::Always);
        self.conn.send(Envelope::new(Payload::SyncComplete)).await?;
        self.drain_queue().await?;

        info!("Sync complete for peer {}: {:?}", self.peer_id, self.stats);
        Ok(self.stats)
    }

    async fn replay(&mut self) -> Result<()> {
        if !self.ctx.peer_authoritative {
            debug!("Single-authority session: skipping staged replay");
            return Ok(());
        }

        for stage in Stage::SEQUENCE {
            self.router.lock().await.begin_stage(stage);
            debug!("Stage {} started for peer {}", stage, self.peer_id);
            self.execute(stage).await?;
            self.router.lock().await.complete_stage(stage);
            debug!("Stage {} complete for peer {}", stage, self.peer_id);
            self.drain_queue().await?;
        }
        Ok(())
    }

    async fn execute(&mut self, stage: Stage) -> Result<()> {
        match stage {
            Stage::LoadAssets => self.replay_assets().await,
            Stage::CreateActors => self.replay_actors().await,
            Stage::SetBehaviors => self.replay_behaviors().await,
            Stage::CreateAnimations => self.replay_animations().await,
            Stage::SyncAnimations => self.reconcile_animations().await,
            Stage::Always | Stage::Never => Ok(()),
        }
    }

    /// Replay cached asset loads in parallel, awaiting every reply, then the
    /// asset updates (no replies expected).
    async fn replay_assets(&mut self) -> Result<()> {
        let assets = self.ctx.cache.assets().await;
        let mut requests = JoinSet::new();
        for cached in assets {
            let conn = self.conn.clone();
            let envelope = cached.reissue();
            requests.spawn(async move { conn.request(envelope).await });
        }
        while let Some(joined) = requests.join_next().await {
            joined.map_err(|e| SyncError::TaskFailed(e.to_string()))??;
            self.stats.assets_replayed += 1;
        }

        for update in self.ctx.cache.asset_updates().await {
            self.conn.send(update.reissue()).await?;
            self.stats.asset_updates_replayed += 1;
        }
        Ok(())
    }

    /// Replay the actor tree depth-first: siblings in parallel, children only
    /// after their parent's reply (child creates reference the parent id).
    async fn replay_actors(&mut self) -> Result<()> {
        let roots = self.ctx.cache.root_actors().await;
        let mut subtrees = JoinSet::new();
        for root in roots {
            subtrees.spawn(send_actor_subtree(
                self.conn.clone(),
                self.ctx.cache.clone(),
                root,
            ));
        }
        while let Some(joined) = subtrees.join_next().await {
            let sent = joined.map_err(|e| SyncError::TaskFailed(e.to_string()))??;
            self.stats.actors_replayed += sent;
        }
        Ok(())
    }

    async fn replay_behaviors(&mut self) -> Result<()> {
        for actor in self.ctx.cache.actors().await {
            if let Some(behavior_type) = actor.behavior {
                self.conn
                    .send(Envelope::new(Payload::SetBehavior {
                        actor_id: actor.actor_id,
                        behavior_type,
                    }))
                    .await?;
                self.stats.behaviors_replayed += 1;
            }
        }
        Ok(())
    }

    /// Forward interpolations disabled (playback resumes next stage), then
    /// send-and-await the created animations.
    async fn replay_animations(&mut self) -> Result<()> {
        for actor in self.ctx.cache.actors().await {
            for interpolation in &actor.active_interpolations {
                let mut envelope = interpolation.reissue();
                if let Payload::InterpolateActor { enabled, .. } = &mut envelope.payload {
                    *enabled = false;
                }
                self.conn.send(envelope).await?;
                self.stats.interpolations_replayed += 1;
            }

            let mut requests = JoinSet::new();
            for animation in &actor.created_animations {
                let conn = self.conn.clone();
                let envelope = animation.reissue();
                requests.spawn(async move { conn.request(envelope).await });
            }
            while let Some(joined) = requests.join_next().await {
                joined.map_err(|e| SyncError::TaskFailed(e.to_string()))??;
                self.stats.animations_replayed += 1;
            }
        }
        Ok(())
    }

    async fn reconcile_animations(&mut self) -> Result<()> {
        if self.is_authoritative {
            debug!("Joining peer is authoritative; skipping animation sync");
            return Ok(());
        }
        let authoritative = self.ctx.authoritative.clone().ok_or_else(|| {
            SyncError::AuthoritativeUnavailable("no authoritative peer in session".to_string())
        })?;
        let reconciled =
            reconcile::sync_animations(authoritative.as_ref(), self.conn.as_ref()).await?;
        self.stats.animation_states_reconciled += reconciled;
        Ok(())
    }

    /// Flush queued messages whose classification has become `allow`.
    ///
    /// Each pass strictly shrinks the queue or leaves it untouched, so the
    /// loop terminates; progress for the remainder requires the next stage
    /// transition.
    async fn drain_queue(&mut self) -> Result<()> {
        loop {
            let mut router = self.router.lock().await;
            let taken = router.take_sendable();
            if taken.is_empty() {
                return Ok(());
            }
            debug!(
                "Draining {} queued messages for peer {}",
                taken.len(),
                self.peer_id
            );
            self.stats.messages_drained += taken.len() as u64;
            for message in taken {
                router.send(message.envelope, message.reply).await?;
            }
            router.join_pending().await?;
        }
    }
}

/// Send one actor's create message, await its reply, then recurse into its
/// children in parallel. Returns the number of actors sent.
fn send_actor_subtree(
    conn: Arc<dyn Connection>,
    cache: Arc<SceneCache>,
    actor: CachedActor,
) -> BoxFuture<'static, Result<u64>> {
    async move {
        conn.request(actor.message.reissue()).await?;
        let mut sent = 1;

        let children = cache.children_of(actor.actor_id).await;
        let mut subtrees = JoinSet::new();
        for child in children {
            subtrees.spawn(send_actor_subtree(conn.clone(), cache.clone(), child));
        }
        while let Some(joined) = subtrees.join_next().await {
            sent += joined.map_err(|e| SyncError::TaskFailed(e.to_string()))??;
        }
        Ok(sent)
    }
    .boxed()
}
