use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::mpsc;

use super::{Listener, ListenerId};

type Registry = HashMap<String, Vec<(ListenerId, mpsc::UnboundedSender<Value>)>>;

/// Listener registry keyed by event name.
///
/// Cloning shares the registry, so the transport's reader task and the
/// handle given to callers see the same listeners.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    listeners: Arc<Mutex<Registry>>,
    next_id: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, event: &str) -> Listener {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        let mut listeners = self.lock();
        // Checked under the lock so a concurrent close cannot miss this sender.
        if !self.closed.load(Ordering::Acquire) {
            listeners.entry(event.to_string()).or_default().push((id, tx));
        }
        drop(listeners);
        Listener {
            id,
            event: event.to_string(),
            rx,
        }
    }

    /// Drop one listener. Its receiver sees the channel close once any
    /// already-queued payloads are drained.
    pub fn unsubscribe(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let Some(entries) = listeners.get_mut(event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(event);
        }
        removed
    }

    /// Fan `payload` out to every listener of `event`. Returns how many
    /// listeners received it; listeners whose receiver is gone are pruned.
    pub fn dispatch(&self, event: &str, payload: &Value) -> usize {
        let mut listeners = self.lock();
        let Some(entries) = listeners.get_mut(event) else {
            tracing::debug!(event, "no listeners for event");
            return 0;
        };
        entries.retain(|(_, tx)| tx.send(payload.clone()).is_ok());
        let delivered = entries.len();
        if entries.is_empty() {
            listeners.remove(event);
        }
        delivered
    }

    /// Drop every listener and refuse new ones: receivers see their channel
    /// close once queued payloads are drained.
    pub fn close(&self) {
        let mut listeners = self.lock();
        self.closed.store(true, Ordering::Release);
        listeners.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.lock().get(event).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // A poisoned registry is still structurally valid.
        self.listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
