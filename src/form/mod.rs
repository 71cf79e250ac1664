//! The trigger creation form.
//!
//! [`FormState`] holds the reference data and selections and knows how to
//! validate and build the request. [`TriggerForm`] binds a state to the push
//! channel: mounting registers the `tags` / `messages` listeners and asks for
//! snapshots, unmounting removes both listeners.

pub mod state;

pub use state::{FormOptions, FormState, Validation};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::TriggerClient;
use crate::channel::{
    EVENT_MESSAGES, EVENT_TAGS, Listener, REQUEST_MESSAGES, REQUEST_TAGS, Socket,
};
use crate::error::{ChannelError, DeskError, FormError};
use crate::model::{RawMessage, Tag};

/// Which collection an applied push event touched, and how many records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    Tags(usize),
    Messages(usize),
}

struct Listeners {
    tags: Listener,
    messages: Listener,
}

#[derive(Default)]
pub struct TriggerForm {
    state: FormState,
    listeners: Option<Listeners>,
    tags_loaded: bool,
    messages_loaded: bool,
}

impl TriggerForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut FormState {
        &mut self.state
    }

    pub fn is_mounted(&self) -> bool {
        self.listeners.is_some()
    }

    /// Both collections have been received at least once since the last
    /// mount or reload.
    pub fn is_loaded(&self) -> bool {
        self.tags_loaded && self.messages_loaded
    }

    pub fn mount<S: Socket + ?Sized>(&mut self, socket: &S) -> Result<(), ChannelError> {
        if self.is_mounted() {
            return Ok(());
        }
        self.listeners = Some(Listeners {
            tags: socket.on(EVENT_TAGS),
            messages: socket.on(EVENT_MESSAGES),
        });
        request_snapshots(socket)
    }

    pub fn unmount<S: Socket + ?Sized>(&mut self, socket: &S) {
        if let Some(listeners) = self.listeners.take() {
            socket.remove_listener(EVENT_TAGS, listeners.tags.id);
            socket.remove_listener(EVENT_MESSAGES, listeners.messages.id);
            tracing::debug!("trigger form unmounted");
        }
    }

    /// Wait for the next push event and apply it. `None` once unmounted or
    /// when the channel has closed.
    pub async fn next_update(&mut self) -> Option<Update> {
        let listeners = self.listeners.as_mut()?;
        let (is_tags, payload) = tokio::select! {
            Some(payload) = listeners.tags.rx.recv() => (true, payload),
            Some(payload) = listeners.messages.rx.recv() => (false, payload),
            else => return None,
        };
        Some(if is_tags {
            self.apply_tags(payload)
        } else {
            self.apply_messages(payload)
        })
    }

    /// Apply every push event already queued, without waiting.
    pub fn apply_pending(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        loop {
            let Some(listeners) = self.listeners.as_mut() else {
                return updates;
            };
            if let Ok(payload) = listeners.tags.rx.try_recv() {
                updates.push(self.apply_tags(payload));
            } else if let Ok(payload) = listeners.messages.rx.try_recv() {
                updates.push(self.apply_messages(payload));
            } else {
                return updates;
            }
        }
    }

    pub async fn wait_until_loaded(&mut self) -> Result<(), DeskError> {
        if !self.is_mounted() {
            return Err(FormError::NotMounted.into());
        }
        while !self.is_loaded() {
            if self.next_update().await.is_none() {
                return Err(ChannelError::Closed.into());
            }
        }
        Ok(())
    }

    /// Post the trigger. On success the form reloads: every collection and
    /// selection is discarded and fresh snapshots are requested. The reply is
    /// returned even when that re-request cannot be sent.
    pub async fn submit<S: Socket + ?Sized>(
        &mut self,
        client: &TriggerClient,
        socket: &S,
    ) -> Result<Value, DeskError> {
        let request = self.state.payload()?;
        match client.create_trigger(&request).await {
            Ok(reply) => {
                // The trigger exists now; a failed re-request only leaves the
                // form empty until the next reload.
                if let Err(e) = self.reload(socket) {
                    tracing::warn!(error = %e, "could not re-request snapshots after submit");
                }
                Ok(reply)
            }
            Err(e) => {
                tracing::error!(error = %e, "error creating trigger");
                Err(e.into())
            }
        }
    }

    pub fn reload<S: Socket + ?Sized>(&mut self, socket: &S) -> Result<(), ChannelError> {
        self.state = FormState::default();
        self.tags_loaded = false;
        self.messages_loaded = false;
        let Some(listeners) = self.listeners.as_mut() else {
            return Ok(());
        };
        // Payloads queued before the reload belong to the discarded state.
        while listeners.tags.rx.try_recv().is_ok() {}
        while listeners.messages.rx.try_recv().is_ok() {}
        request_snapshots(socket)
    }

    fn apply_tags(&mut self, payload: Value) -> Update {
        let Some(tags) = decode_batch::<Tag>(EVENT_TAGS, payload) else {
            return Update::Tags(0);
        };
        self.tags_loaded = true;
        Update::Tags(self.state.handle_tags(tags))
    }

    fn apply_messages(&mut self, payload: Value) -> Update {
        let Some(messages) = decode_batch::<RawMessage>(EVENT_MESSAGES, payload) else {
            return Update::Messages(0);
        };
        self.messages_loaded = true;
        Update::Messages(self.state.handle_messages(messages))
    }
}

fn request_snapshots<S: Socket + ?Sized>(socket: &S) -> Result<(), ChannelError> {
    socket.emit(REQUEST_TAGS, None)?;
    socket.emit(REQUEST_MESSAGES, None)
}

/// `None` when the payload is not a collection at all. Records that fail to
/// deserialize are dropped individually.
fn decode_batch<T: DeserializeOwned>(event: &str, payload: Value) -> Option<Vec<T>> {
    let Value::Array(items) = payload else {
        tracing::warn!(event, "push payload is not an array; ignoring");
        return None;
    };
    let records = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(event, error = %e, "skipping malformed record");
                None
            }
        })
        .collect();
    Some(records)
}
