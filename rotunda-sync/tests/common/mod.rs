//! Scripted remote peer for exercising the sync protocol end to end.

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use rotunda_net::{Connection, MemoryConnection};
use rotunda_proto::{AnimationStateSample, Envelope, MessageKind, Payload, ResultCode};

/// Install a log subscriber for the test process; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// A simulated client peer: records everything the server sends and answers
/// requests the way a rendering client would.
pub struct ScriptedPeer {
    pub conn: MemoryConnection,
    log: Arc<StdMutex<Vec<Envelope>>>,
    held_kinds: Arc<StdMutex<HashSet<MessageKind>>>,
    held: Arc<StdMutex<Vec<Envelope>>>,
    animation_states: Vec<AnimationStateSample>,
    _responder: JoinHandle<()>,
}

impl ScriptedPeer {
    pub fn spawn(conn: MemoryConnection) -> Self {
        Self::spawn_with_animations(conn, Vec::new())
    }

    /// Spawn a peer that reports the given animation states when asked.
    pub fn spawn_with_animations(
        conn: MemoryConnection,
        animation_states: Vec<AnimationStateSample>,
    ) -> Self {
        let log: Arc<StdMutex<Vec<Envelope>>> = Arc::new(StdMutex::new(Vec::new()));
        let held_kinds: Arc<StdMutex<HashSet<MessageKind>>> =
            Arc::new(StdMutex::new(HashSet::new()));
        let held: Arc<StdMutex<Vec<Envelope>>> = Arc::new(StdMutex::new(Vec::new()));

        let responder = {
            let conn = conn.clone();
            let log = log.clone();
            let held_kinds = held_kinds.clone();
            let held = held.clone();
            let animation_states = animation_states.clone();
            tokio::spawn(async move {
                while let Ok(envelope) = conn.recv().await {
                    log.lock().unwrap().push(envelope.clone());
                    if held_kinds.lock().unwrap().contains(&envelope.kind()) {
                        held.lock().unwrap().push(envelope);
                        continue;
                    }
                    if let Some(reply) = auto_reply(&envelope, &animation_states) {
                        if conn.send(reply).await.is_err() {
                            break;
                        }
                    }
                }
            })
        };

        Self {
            conn,
            log,
            held_kinds,
            held,
            animation_states,
            _responder: responder,
        }
    }

    pub async fn request_sync(&self) {
        self.conn
            .send(Envelope::new(Payload::SyncRequest))
            .await
            .expect("send sync-request");
    }

    /// Everything the server has sent this peer, in arrival order.
    pub fn received(&self) -> Vec<Envelope> {
        self.log.lock().unwrap().clone()
    }

    pub fn received_kinds(&self) -> Vec<MessageKind> {
        self.received().iter().map(Envelope::kind).collect()
    }

    /// Index of the first received envelope of the given kind.
    pub fn position_of(&self, kind: MessageKind) -> Option<usize> {
        self.received().iter().position(|e| e.kind() == kind)
    }

    /// Stop auto-replying to the given kind; requests pile up until released.
    pub fn hold(&self, kind: MessageKind) {
        self.held_kinds.lock().unwrap().insert(kind);
    }

    /// Answer every request held back for the given kind.
    pub async fn release(&self, kind: MessageKind) {
        self.held_kinds.lock().unwrap().remove(&kind);
        let ready: Vec<Envelope> = {
            let mut held = self.held.lock().unwrap();
            let (ready, rest) = held.drain(..).partition(|e| e.kind() == kind);
            *held = rest;
            ready
        };
        for envelope in ready {
            if let Some(reply) = auto_reply(&envelope, &self.animation_states) {
                self.conn.send(reply).await.expect("send held reply");
            }
        }
    }

    /// Poll until the peer has received an envelope of the given kind.
    pub async fn wait_for(&self, kind: MessageKind) -> Envelope {
        for _ in 0..500 {
            if let Some(found) = self.received().into_iter().find(|e| e.kind() == kind) {
                return found;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {}", kind);
    }
}

fn auto_reply(envelope: &Envelope, animation_states: &[AnimationStateSample]) -> Option<Envelope> {
    match envelope.kind() {
        MessageKind::Heartbeat => Some(envelope.reply(Payload::Heartbeat)),
        MessageKind::CreateActor | MessageKind::CreateFromLibrary => {
            Some(envelope.reply(Payload::ObjectSpawned {
                actors: Vec::new(),
                result: ResultCode::Success,
            }))
        }
        MessageKind::CreateAsset | MessageKind::LoadAssets => {
            Some(envelope.reply(Payload::AssetsLoaded {
                assets: Vec::new(),
                failure_message: None,
            }))
        }
        MessageKind::CreateAnimation => Some(envelope.reply(Payload::OperationResult {
            result_code: ResultCode::Success,
            message: None,
        })),
        MessageKind::SyncAnimations => Some(envelope.reply(Payload::SyncAnimations {
            animation_states: animation_states.to_vec(),
        })),
        _ => None,
    }
}
