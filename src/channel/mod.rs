pub mod bus;
pub mod packet;
pub mod push;

pub use bus::EventBus;
pub use push::PushChannel;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::ChannelError;

/// Events the server pushes.
pub const EVENT_TAGS: &str = "tags";
pub const EVENT_MESSAGES: &str = "messages";

/// Snapshot requests the client emits.
pub const REQUEST_TAGS: &str = "get-tags";
pub const REQUEST_MESSAGES: &str = "get-messages";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Receiving end of one `on(event)` registration.
#[derive(Debug)]
pub struct Listener {
    pub id: ListenerId,
    pub event: String,
    pub rx: mpsc::UnboundedReceiver<Value>,
}

/// Event-style push channel as seen by consumers: register listeners by
/// event name and emit named events to the server.
pub trait Socket: Send + Sync {
    fn on(&self, event: &str) -> Listener;

    fn remove_listener(&self, event: &str, id: ListenerId);

    /// Queue an event for the server. Never blocks on the network.
    fn emit(&self, event: &str, payload: Option<Value>) -> Result<(), ChannelError>;
}
