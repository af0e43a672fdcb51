//! A group of peers sharing one application instance and one scene cache.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::Utc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use rotunda_net::Connection;
use rotunda_proto::Envelope;
use rotunda_scene::SceneCache;
use rotunda_sync::{startup, ReplySender, Router, SyncConfig, SyncContext, SyncDriver};

use crate::errors::{Result, ServerError};
use crate::peer::Peer;

/// Configuration for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Whether peers carry authoritative scene state. When false (single
    /// authority), joining peers skip the staged replay; the router still
    /// governs their traffic until sync completes.
    pub peer_authoritative: bool,
    /// Per-peer sync tunables.
    pub sync: SyncConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            peer_authoritative: true,
            sync: SyncConfig::default(),
        }
    }
}

/// One multi-user session.
///
/// The application publishes messages through [`Session::publish`]; joined
/// peers receive them directly, peers still syncing receive them through
/// their router. Replies awaited by the application while the authoritative
/// peer is mid-sync are mirrored onto the channel returned by
/// [`Session::new`].
pub struct Session {
    config: SessionConfig,
    cache: Arc<SceneCache>,
    peers: RwLock<HashMap<Uuid, Peer>>,
    syncing: RwLock<HashMap<Uuid, Arc<Mutex<Router>>>>,
    /// Connection of every peer currently holding an order, mid-sync or
    /// joined, keyed by order. The lowest entry is the authoritative peer;
    /// entries leave on failed joins and removals.
    assigned: StdMutex<BTreeMap<u32, Arc<dyn Connection>>>,
    next_order: AtomicU32,
    app_tx: mpsc::UnboundedSender<Envelope>,
}

impl Session {
    /// Create a session and the application-facing reply channel.
    pub fn new(config: SessionConfig) -> (Arc<Self>, mpsc::UnboundedReceiver<Envelope>) {
        let (app_tx, app_rx) = mpsc::unbounded_channel();
        let session = Arc::new(Self {
            config,
            cache: Arc::new(SceneCache::new()),
            peers: RwLock::new(HashMap::new()),
            syncing: RwLock::new(HashMap::new()),
            assigned: StdMutex::new(BTreeMap::new()),
            next_order: AtomicU32::new(0),
            app_tx,
        });
        (session, app_rx)
    }

    pub fn cache(&self) -> &Arc<SceneCache> {
        &self.cache
    }

    pub async fn peer_count(&self) -> usize {
        self.peers.read().await.len()
    }

    pub async fn peer(&self, peer_id: Uuid) -> Option<Peer> {
        self.peers.read().await.get(&peer_id).cloned()
    }

    /// The joined peer with the lowest order, if any.
    pub async fn authoritative_peer(&self) -> Option<Peer> {
        self.peers
            .read()
            .await
            .values()
            .min_by_key(|peer| peer.order)
            .cloned()
    }

    /// Bring a freshly connected peer into the session.
    ///
    /// Runs the startup handshake and the staged sync; the peer is
    /// registered only when both succeed. On failure the connection is
    /// closed and the peer is treated as never having joined.
    pub async fn join(self: Arc<Self>, conn: Arc<dyn Connection>) -> Result<Peer> {
        let peer_id = Uuid::new_v4();
        let order = {
            // Order assignment and ledger entry are one atomic step, so a
            // peer deciding authority always sees every lower order.
            let mut assigned = self.assigned.lock().unwrap();
            let order = self.next_order.fetch_add(1, Ordering::SeqCst);
            assigned.insert(order, conn.clone());
            order
        };
        debug!("Peer {} connecting (order {})", peer_id, order);

        let result = self.clone().sync_peer(peer_id, order, conn.clone()).await;
        match result {
            Ok(authoritative) => {
                let peer = Peer {
                    id: peer_id,
                    order,
                    conn,
                    authoritative,
                    joined_at: Utc::now(),
                };
                self.peers.write().await.insert(peer_id, peer.clone());
                info!(
                    "Peer {} joined (order {}, authoritative: {})",
                    peer_id, order, authoritative
                );
                Ok(peer)
            }
            Err(e) => {
                self.assigned.lock().unwrap().remove(&order);
                warn!("Peer {} failed to join: {}", peer_id, e);
                conn.close();
                Err(e)
            }
        }
    }

    /// Run the startup protocol and staged sync; returns whether the peer
    /// becomes the authoritative peer.
    async fn sync_peer(
        self: Arc<Self>,
        peer_id: Uuid,
        order: u32,
        conn: Arc<dyn Connection>,
    ) -> Result<bool> {
        let latency_ms = startup::handshake(&conn, &self.config.sync).await?;
        debug!("Peer {} link latency: {:.3} ms", peer_id, latency_ms);

        // Authority belongs to the lowest order ever assigned, whether that
        // peer has finished its own sync or not.
        let (becomes_authoritative, authoritative_conn) = {
            let assigned = self.assigned.lock().unwrap();
            match assigned.iter().next() {
                Some((&lowest, authoritative)) if lowest < order => {
                    (false, Some(authoritative.clone()))
                }
                _ => (true, None),
            }
        };

        let mut router = Router::new(peer_id, conn.clone());
        if becomes_authoritative {
            // The application awaits replies that only the authoritative
            // peer can produce, so mirror them while it is still syncing.
            router = router.with_reply_echo(self.app_tx.clone());
        }
        let router = Arc::new(Mutex::new(router));
        self.syncing.write().await.insert(peer_id, router.clone());

        let driver = SyncDriver::new(
            peer_id,
            conn,
            router,
            SyncContext {
                cache: self.cache.clone(),
                peer_authoritative: self.config.peer_authoritative,
                authoritative: authoritative_conn,
            },
            becomes_authoritative,
        );
        let result = driver.run().await;
        self.syncing.write().await.remove(&peer_id);
        result?;
        Ok(becomes_authoritative)
    }

    /// Record a message in the cache and deliver it to every peer.
    ///
    /// Joined peers receive live traffic directly; peers still syncing go
    /// through their router, which may defer or drop per the rule table. A
    /// single unreachable peer does not fail the publish.
    pub async fn publish(&self, envelope: Envelope) -> Result<()> {
        self.cache.record(&envelope).await?;

        for peer in self.peers.read().await.values() {
            if let Err(e) = peer.conn.send(envelope.clone()).await {
                warn!("Failed to deliver {} to peer {}: {}", envelope.kind(), peer.id, e);
            }
        }
        for router in self.syncing.read().await.values() {
            router.lock().await.send(envelope.clone(), None).await?;
        }
        Ok(())
    }

    /// Send one message to one peer, optionally awaiting its reply through
    /// the given continuation.
    pub async fn send_to(
        &self,
        peer_id: Uuid,
        envelope: Envelope,
        reply: Option<ReplySender>,
    ) -> Result<()> {
        if let Some(router) = self.syncing.read().await.get(&peer_id) {
            router.lock().await.send(envelope, reply).await?;
            return Ok(());
        }

        let peer = self
            .peer(peer_id)
            .await
            .ok_or(ServerError::UnknownPeer(peer_id))?;
        match reply {
            None => peer.conn.send(envelope).await?,
            Some(reply_tx) => {
                let response = peer.conn.request(envelope).await;
                match response {
                    Ok(response) => {
                        let _ = reply_tx.send(Ok(Some(response)));
                    }
                    Err(e) => {
                        let _ = reply_tx.send(Err(rotunda_sync::SyncError::ReplyFailed(
                            e.to_string(),
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Drop a peer from the session; the authoritative role migrates to the
    /// next-lowest join order.
    pub async fn remove(&self, peer_id: Uuid) -> Result<Peer> {
        let mut peers = self.peers.write().await;
        let removed = peers
            .remove(&peer_id)
            .ok_or(ServerError::UnknownPeer(peer_id))?;
        self.assigned.lock().unwrap().remove(&removed.order);
        removed.conn.close();

        if removed.authoritative {
            if let Some(successor) = peers.values_mut().min_by_key(|peer| peer.order) {
                successor.authoritative = true;
                info!(
                    "Peer {} left; peer {} is now authoritative",
                    peer_id, successor.id
                );
            }
        } else {
            info!("Peer {} left", peer_id);
        }
        Ok(removed)
    }
}
