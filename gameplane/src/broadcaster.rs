//! Fans out applied-state snapshots to registered Followers. Grounded on
//! the transactor's broadcaster component, reworked for the redesigned
//! backpressure policy: one bounded queue per follower instead of a single
//! broadcast channel, so a stalled follower only ever drops its own
//! newest update rather than lagging every receiver.

use std::collections::HashMap;
use std::sync::Arc;

use chess_core::types::ChessState;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

struct FollowerChannel {
    address: String,
    tx: mpsc::Sender<ChessState>,
}

/// Registry of per-follower broadcast queues. `register`/`unregister` take
/// the registry lock briefly; `broadcast` copies the sender list out and
/// releases the lock before doing any queueing, so a slow follower never
/// blocks `AddSlave`/registration traffic.
pub struct Broadcaster {
    channels: Mutex<HashMap<String, FollowerChannel>>,
    queue_depth: usize,
}

impl Broadcaster {
    pub fn new(queue_depth: usize) -> Arc<Self> {
        Arc::new(Self {
            channels: Mutex::new(HashMap::new()),
            queue_depth,
        })
    }

    /// Registers a follower and returns the receiving end of its queue. A
    /// re-registration (e.g. after a reconnect) replaces the previous
    /// channel outright.
    pub async fn register(&self, follower_id: &str, address: &str) -> mpsc::Receiver<ChessState> {
        let (tx, rx) = mpsc::channel(self.queue_depth.max(1));
        let mut channels = self.channels.lock().await;
        channels.insert(
            follower_id.to_string(),
            FollowerChannel {
                address: address.to_string(),
                tx,
            },
        );
        rx
    }

    pub async fn unregister(&self, follower_id: &str) {
        self.channels.lock().await.remove(follower_id);
    }

    /// Pushes `state` to every registered follower's queue. Never holds the
    /// registry lock while sending: the lock only guards copying the
    /// current sender list out.
    pub async fn broadcast(&self, state: &ChessState) {
        let senders: Vec<(String, String, mpsc::Sender<ChessState>)> = {
            let channels = self.channels.lock().await;
            channels
                .iter()
                .map(|(id, ch)| (id.clone(), ch.address.clone(), ch.tx.clone()))
                .collect()
        };

        for (follower_id, address, tx) in senders {
            match tx.try_send(state.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        %follower_id,
                        %address,
                        "follower broadcast queue full, dropping this update"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(%follower_id, "follower channel closed, dropping from registry");
                    self.unregister(&follower_id).await;
                }
            }
        }
    }
}
