//! Shared helpers for cross-crate integration tests.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use rotunda::net::{Connection, MemoryConnection};
use rotunda::proto::{
    AnimationStateSample, Envelope, MessageKind, Payload, ResultCode,
};

/// A minimal rendering client: answers the server's requests and records
/// everything it receives.
pub struct TestClient {
    pub conn: MemoryConnection,
    log: Arc<StdMutex<Vec<Envelope>>>,
    _responder: JoinHandle<()>,
}

impl TestClient {
    pub fn spawn(conn: MemoryConnection) -> Self {
        Self::spawn_with_animations(conn, Vec::new())
    }

    /// Spawn a client that reports the given animation states when asked.
    pub fn spawn_with_animations(
        conn: MemoryConnection,
        animation_states: Vec<AnimationStateSample>,
    ) -> Self {
        let log: Arc<StdMutex<Vec<Envelope>>> = Arc::new(StdMutex::new(Vec::new()));

        let responder = {
            let conn = conn.clone();
            let log = log.clone();
            tokio::spawn(async move {
                while let Ok(envelope) = conn.recv().await {
                    log.lock().unwrap().push(envelope.clone());
                    let reply = match envelope.kind() {
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
                        MessageKind::CreateAnimation => {
                            Some(envelope.reply(Payload::OperationResult {
                                result_code: ResultCode::Success,
                                message: None,
                            }))
                        }
                        MessageKind::SyncAnimations => {
                            Some(envelope.reply(Payload::SyncAnimations {
                                animation_states: animation_states.clone(),
                            }))
                        }
                        _ => None,
                    };
                    if let Some(reply) = reply {
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
            _responder: responder,
        }
    }

    pub async fn request_sync(&self) {
        self.conn
            .send(Envelope::new(Payload::SyncRequest))
            .await
            .expect("send sync-request");
    }

    pub fn received(&self) -> Vec<Envelope> {
        self.log.lock().unwrap().clone()
    }

    pub fn received_kinds(&self) -> Vec<MessageKind> {
        self.received().iter().map(Envelope::kind).collect()
    }

    /// Poll until the client has received an envelope of the given kind.
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
