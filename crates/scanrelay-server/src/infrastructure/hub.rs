//! The broadcast hub: subscriber set plus fire-and-forget fan-out.
//!
//! # Design
//!
//! The hub is an explicitly owned object injected into the components that
//! need it (the WebSocket accept loop adds/removes subscribers, the
//! dispatcher broadcasts).  There is no ambient global state: create the hub
//! at startup, clone the cheap handle wherever needed, and everything is
//! torn down when the last handle drops.
//!
//! Each subscriber is an unbounded mpsc sender keyed by a fresh UUID.  The
//! WebSocket session that owns the matching receiver pumps messages onto the
//! socket.  This indirection is what makes `broadcast` non-blocking: sending
//! on an unbounded channel never waits, so a slow browser can never stall
//! the dispatcher.
//!
//! # Delivery semantics
//!
//! Fire-and-forget, at-most-once: a send to a closed channel is skipped (the
//! subscriber's session has ended) and the dead entry is pruned in the same
//! pass.  There is no acknowledgment, no retry, no queueing for departed
//! subscribers, and no active health check — membership is appended on
//! connect and pruned lazily on the first failed send.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Shared handle to the subscriber set.
///
/// Cloning is cheap (one `Arc` bump); all clones see the same subscribers.
#[derive(Debug, Clone, Default)]
pub struct Hub {
    /// Live subscribers.  Guarded by a std `Mutex` — every critical section
    /// is a handful of non-awaiting map operations, so an async lock would
    /// buy nothing.
    subscribers: Arc<Mutex<HashMap<Uuid, mpsc::UnboundedSender<String>>>>,
}

impl Hub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber and returns its id plus the receiving end
    /// of its message channel.
    ///
    /// The caller (a WebSocket session task) owns the receiver; dropping it
    /// closes the channel, which is how the hub eventually notices the
    /// subscriber is gone.
    pub fn subscribe(&self) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        self.lock().insert(id, tx);
        debug!(subscriber = %id, "subscriber registered");

        (id, rx)
    }

    /// Removes a subscriber explicitly (normal session teardown).
    ///
    /// Removing an id that was already pruned is a no-op.
    pub fn unsubscribe(&self, id: Uuid) {
        if self.lock().remove(&id).is_some() {
            debug!(subscriber = %id, "subscriber removed");
        }
    }

    /// Number of currently registered subscribers (pruned entries excluded).
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Pushes one message to every live subscriber.
    ///
    /// Returns the number of subscribers the message was handed to.
    /// Subscribers whose channel is closed are skipped and removed in the
    /// same pass; a dead subscriber never aborts delivery to the others.
    pub fn broadcast(&self, message: &str) -> usize {
        let mut subscribers = self.lock();
        let mut delivered = 0;

        // Send first, collect the dead, then prune — never mutate the map
        // while iterating it.
        let mut dead: Vec<Uuid> = Vec::new();
        for (id, tx) in subscribers.iter() {
            if tx.send(message.to_string()).is_ok() {
                delivered += 1;
            } else {
                dead.push(*id);
            }
        }

        for id in dead {
            subscribers.remove(&id);
            debug!(subscriber = %id, "pruned closed subscriber");
        }

        delivered
    }

    /// Locks the subscriber map, recovering from a poisoned lock.
    ///
    /// No critical section here can leave the map in an inconsistent state,
    /// so if a holder panicked the data is still usable.
    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<Uuid, mpsc::UnboundedSender<String>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
