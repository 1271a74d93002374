//! Game state channel - holds the latest snapshot from the feed
//!
//! The feed transport is the only writer; the refresh loop and the display
//! reconciler only ever read whole snapshots. Writers never block on readers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use super::types::GameState;

/// Notification sent to subscribers whenever the snapshot is replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotChanged {
    pub revision: u64,
}

#[derive(Default)]
struct Inner {
    current: RwLock<Option<Arc<GameState>>>,
    revision: AtomicU64,
    subscribers: Mutex<Vec<Sender<SnapshotChanged>>>,
}

/// Shared handle to the current game state snapshot
#[derive(Clone, Default)]
pub struct GameStateChannel {
    inner: Arc<Inner>,
}

impl GameStateChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot, or None until the first feed message arrives
    pub fn current(&self) -> Option<Arc<GameState>> {
        self.inner.current.read().clone()
    }

    /// Number of snapshot replacements so far
    pub fn revision(&self) -> u64 {
        self.inner.revision.load(Ordering::SeqCst)
    }

    /// Subscribe to snapshot replacement notifications
    pub fn subscribe(&self) -> Receiver<SnapshotChanged> {
        let (tx, rx) = unbounded();
        self.inner.subscribers.lock().push(tx);
        rx
    }

    /// Replace the snapshot wholesale.
    ///
    /// Returns false when the new snapshot is identical to the current one,
    /// in which case nothing changes and no notification is sent.
    pub fn replace(&self, state: GameState) -> bool {
        let state = state.normalize();

        let revision = {
            let mut current = self.inner.current.write();
            if current.as_deref() == Some(&state) {
                trace!("[FEED] Same snapshot, ignoring");
                return false;
            }
            *current = Some(Arc::new(state));
            self.inner.revision.fetch_add(1, Ordering::SeqCst) + 1
        };

        debug!(revision, "[FEED] Snapshot replaced");

        let changed = SnapshotChanged { revision };
        self.inner
            .subscribers
            .lock()
            .retain(|tx| tx.send(changed).is_ok());
        true
    }

    /// Parse a raw feed payload and replace the snapshot.
    ///
    /// Malformed payloads are logged and discarded; the previous snapshot
    /// stays in effect.
    pub fn ingest_json(&self, payload: &str) -> bool {
        match serde_json::from_str::<GameState>(payload) {
            Ok(state) => self.replace(state),
            Err(e) => {
                warn!(error = %e, "[FEED] Failed to parse game state, keeping previous snapshot");
                false
            }
        }
    }
}
