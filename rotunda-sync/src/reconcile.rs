//! Latency-compensated animation time reconciliation.

use tracing::{debug, info};

use rotunda_net::Connection;
use rotunda_proto::{Envelope, Payload};

use crate::errors::{Result, SyncError};

/// Pull live animation state from the authoritative peer and forward it to
/// the joining peer with latency-compensated playheads.
///
/// Each sample's `time` is biased forward by the estimated one-way delay of
/// both links (`latency_ms / 1000 / 2` each), so the joining peer's playback
/// clock matches the authoritative peer's current playhead when it starts.
/// The adjusted payload goes out through the raw connection; sync-animations
/// is explicitly allowed during its own stage.
pub async fn sync_animations(
    authoritative: &dyn Connection,
    joining: &dyn Connection,
) -> Result<u64> {
    let request = Envelope::new(Payload::SyncAnimations {
        animation_states: Vec::new(),
    });
    let reply = authoritative
        .request(request)
        .await
        .map_err(|e| SyncError::AuthoritativeUnavailable(e.to_string()))?;

    let Payload::SyncAnimations {
        mut animation_states,
    } = reply.payload
    else {
        return Err(SyncError::Protocol(format!(
            "Expected sync-animations reply, got {}",
            reply.kind()
        )));
    };

    let bias =
        authoritative.quality().latency_ms / 2000.0 + joining.quality().latency_ms / 2000.0;
    for sample in &mut animation_states {
        sample.state.time += bias;
        debug!(
            "Animation {} playhead advanced to {:.3}s",
            sample.animation_id, sample.state.time
        );
    }

    let count = animation_states.len() as u64;
    joining
        .send(Envelope::new(Payload::SyncAnimations { animation_states }))
        .await?;
    info!(
        "Reconciled {} animation states (+{:.3}s latency bias)",
        count, bias
    );
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotunda_net::MemoryConnection;
    use rotunda_proto::{AnimationState, AnimationStateSample, MessageKind};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_playhead_compensates_for_both_links() {
        let (auth_server, auth_client) = MemoryConnection::pair();
        let (join_server, join_client) = MemoryConnection::pair();
        auth_server.set_latency(100.0);
        join_server.set_latency(60.0);

        let animation_id = Uuid::new_v4();
        let responder = tokio::spawn(async move {
            let request = auth_client.recv().await.unwrap();
            assert_eq!(request.kind(), MessageKind::SyncAnimations);
            auth_client
                .send(request.reply(Payload::SyncAnimations {
                    animation_states: vec![AnimationStateSample {
                        animation_id,
                        state: AnimationState {
                            time: 10.0,
                            speed: 1.0,
                            enabled: Some(true),
                        },
                    }],
                }))
                .await
                .unwrap();
        });

        let count = sync_animations(&auth_server, &join_server).await.unwrap();
        assert_eq!(count, 1);
        responder.await.unwrap();

        let forwarded = join_client.recv().await.unwrap();
        match forwarded.payload {
            Payload::SyncAnimations { animation_states } => {
                assert_eq!(animation_states.len(), 1);
                assert_eq!(animation_states[0].animation_id, animation_id);
                let time = animation_states[0].state.time;
                assert!((time - 10.080).abs() < 1e-9, "time was {}", time);
            }
            other => panic!("unexpected payload: {:?}", other.kind()),
        }
    }

    #[tokio::test]
    async fn test_unreachable_authoritative_peer_fails_the_sync() {
        let (auth_server, auth_client) = MemoryConnection::pair();
        let (join_server, _join_client) = MemoryConnection::pair();

        // Authoritative peer hangs up instead of answering.
        let hangup = tokio::spawn(async move {
            let _ = auth_client.recv().await.unwrap();
            auth_client.close();
        });

        let result = sync_animations(&auth_server, &join_server).await;
        assert!(matches!(
            result,
            Err(SyncError::AuthoritativeUnavailable(_))
        ));
        hangup.await.unwrap();
    }
}
