//! In-process connection pair built on tokio channels.
//!
//! Frames cross the pair as encoded JSON, so the codec path is exercised the
//! same way a network transport would. Each side runs a small pump task that
//! routes correlated replies to their waiting request and everything else to
//! the `recv` queue.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

use rotunda_proto::{validation, Envelope};

use crate::connection::{Connection, ConnectionQuality};
use crate::errors::{NetError, Result};

type PendingMap = Arc<StdMutex<HashMap<Uuid, oneshot::Sender<Envelope>>>>;

struct Inner {
    outbound: StdMutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    app_rx: Mutex<mpsc::UnboundedReceiver<Envelope>>,
    pending: PendingMap,
    quality: StdMutex<ConnectionQuality>,
    closed: AtomicBool,
}

/// One end of an in-memory duplex connection.
#[derive(Clone)]
pub struct MemoryConnection {
    inner: Arc<Inner>,
}

impl MemoryConnection {
    /// Create a connected pair of endpoints.
    pub fn pair() -> (MemoryConnection, MemoryConnection) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();

        let a = MemoryConnection::build(a_tx, b_rx);
        let b = MemoryConnection::build(b_tx, a_rx);
        (a, b)
    }

    fn build(
        outbound: mpsc::UnboundedSender<Vec<u8>>,
        raw_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    ) -> MemoryConnection {
        let (app_tx, app_rx) = mpsc::unbounded_channel();
        let pending: PendingMap = Arc::new(StdMutex::new(HashMap::new()));

        let inner = Arc::new(Inner {
            outbound: StdMutex::new(Some(outbound)),
            app_rx: Mutex::new(app_rx),
            pending: pending.clone(),
            quality: StdMutex::new(ConnectionQuality::default()),
            closed: AtomicBool::new(false),
        });

        tokio::spawn(Self::pump(raw_rx, app_tx, pending, inner.clone()));

        MemoryConnection { inner }
    }

    /// Route inbound frames: correlated replies wake their request, the rest
    /// queue for `recv`.
    async fn pump(
        mut raw_rx: mpsc::UnboundedReceiver<Vec<u8>>,
        app_tx: mpsc::UnboundedSender<Envelope>,
        pending: PendingMap,
        inner: Arc<Inner>,
    ) {
        while let Some(frame) = raw_rx.recv().await {
            let envelope: Envelope = match serde_json::from_slice(&frame) {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!("Dropping undecodable frame: {}", e);
                    continue;
                }
            };

            if let Some(reply_to) = envelope.reply_to_id {
                let slot = pending.lock().unwrap().remove(&reply_to);
                if let Some(slot) = slot {
                    let _ = slot.send(envelope);
                    continue;
                }
                debug!("Reply for unknown request {}, delivering as inbound", reply_to);
            }

            if app_tx.send(envelope).is_err() {
                break;
            }
        }

        // Peer hung up: reject in-flight requests by dropping their slots.
        inner.closed.store(true, Ordering::SeqCst);
        pending.lock().unwrap().clear();
    }

    fn encode(envelope: &Envelope) -> Result<Vec<u8>> {
        validation::validate_envelope(envelope)?;
        let frame = serde_json::to_vec(envelope)?;
        validation::validate_message_size(frame.len())?;
        Ok(frame)
    }

    fn push_frame(&self, frame: Vec<u8>) -> Result<()> {
        let outbound = self.inner.outbound.lock().unwrap();
        let sender = outbound.as_ref().ok_or(NetError::Closed)?;
        sender.send(frame).map_err(|_| NetError::Closed)
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn send(&self, envelope: Envelope) -> Result<()> {
        let frame = Self::encode(&envelope)?;
        self.push_frame(frame)
    }

    async fn request(&self, envelope: Envelope) -> Result<Envelope> {
        let frame = Self::encode(&envelope)?;
        let (slot_tx, slot_rx) = oneshot::channel();
        self.inner
            .pending
            .lock()
            .unwrap()
            .insert(envelope.id, slot_tx);

        if let Err(e) = self.push_frame(frame) {
            self.inner.pending.lock().unwrap().remove(&envelope.id);
            return Err(e);
        }

        slot_rx.await.map_err(|_| NetError::Closed)
    }

    async fn recv(&self) -> Result<Envelope> {
        let mut app_rx = self.inner.app_rx.lock().await;
        app_rx.recv().await.ok_or(NetError::Closed)
    }

    fn quality(&self) -> ConnectionQuality {
        *self.inner.quality.lock().unwrap()
    }

    fn set_latency(&self, latency_ms: f64) {
        self.inner.quality.lock().unwrap().latency_ms = latency_ms;
    }

    fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.outbound.lock().unwrap().take();
        self.inner.pending.lock().unwrap().clear();
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}
