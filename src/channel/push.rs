use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use super::packet::{self, Packet};
use super::{EventBus, Listener, ListenerId, Socket};
use crate::error::ChannelError;

type WsError = tokio_tungstenite::tungstenite::Error;

/// WebSocket connection to the server's push channel.
///
/// A reader task decodes frames and fans events out through the
/// [`EventBus`]; a writer task drains the outbound queue so `emit` never
/// waits on the socket. Both tasks stop when the channel is dropped.
pub struct PushChannel {
    bus: EventBus,
    outbound: mpsc::UnboundedSender<String>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl PushChannel {
    pub async fn connect(channel_url: &Url) -> Result<Self, ChannelError> {
        let ws_url = engine_url(channel_url)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(ws_url.as_str())
            .await
            .map_err(|e| ChannelError::Connection {
                url: ws_url.to_string(),
                message: e.to_string(),
            })?;
        let (mut write, mut read) = ws_stream.split();

        let bus = EventBus::new();
        handshake(&mut read, &mut write, &bus).await?;
        tracing::info!(url = %ws_url, "push channel connected");

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_loop(write, outbound_rx));
        let reader = tokio::spawn(read_loop(read, bus.clone(), outbound.clone()));

        Ok(Self {
            bus,
            outbound,
            reader,
            writer,
        })
    }

    /// Whether the server side is still delivering frames.
    pub fn is_open(&self) -> bool {
        !self.reader.is_finished()
    }
}

impl Socket for PushChannel {
    fn on(&self, event: &str) -> Listener {
        self.bus.subscribe(event)
    }

    fn remove_listener(&self, event: &str, id: ListenerId) {
        self.bus.unsubscribe(event, id);
    }

    fn emit(&self, event: &str, payload: Option<Value>) -> Result<(), ChannelError> {
        tracing::debug!(event, "emitting push channel event");
        self.outbound
            .send(packet::encode_event(event, payload.as_ref()))
            .map_err(|_| ChannelError::Closed)
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Turn a configured channel URL into the Engine.IO WebSocket endpoint.
///
/// `http(s)` schemes map to `ws(s)`; a bare host gets the default
/// `/socket.io/` path; the protocol query is added unless already present.
pub fn engine_url(channel_url: &Url) -> Result<Url, ChannelError> {
    let mut url = channel_url.clone();
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ChannelError::Connection {
                url: channel_url.to_string(),
                message: format!("unsupported scheme {other}"),
            });
        }
    };
    url.set_scheme(scheme).map_err(|()| ChannelError::Connection {
        url: channel_url.to_string(),
        message: "cannot switch scheme".into(),
    })?;

    if url.path().is_empty() || url.path() == "/" {
        url.set_path("/socket.io/");
    }
    if !url.query_pairs().any(|(key, _)| key == "EIO") {
        url.query_pairs_mut()
            .append_pair("EIO", "4")
            .append_pair("transport", "websocket");
    }
    Ok(url)
}

async fn handshake<R, W>(read: &mut R, write: &mut W, bus: &EventBus) -> Result<(), ChannelError>
where
    R: Stream<Item = Result<Message, WsError>> + Unpin,
    W: Sink<Message, Error = WsError> + Unpin,
{
    loop {
        let Some(frame) = read.next().await else {
            return Err(ChannelError::Closed);
        };
        let frame = frame.map_err(|e| ChannelError::Packet(e.to_string()))?;
        let Message::Text(text) = frame else {
            continue;
        };

        match packet::decode(text.as_str())? {
            Packet::Open(info) => {
                let sid = info.get("sid").and_then(Value::as_str).unwrap_or_default();
                tracing::debug!(sid, "engine session opened");
                send_frame(write, packet::CONNECT).await?;
            }
            Packet::Connect(_) => return Ok(()),
            Packet::ConnectError(reason) => {
                let message = reason
                    .get("message")
                    .and_then(Value::as_str)
                    .map_or_else(|| reason.to_string(), str::to_string);
                return Err(ChannelError::ConnectRefused(message));
            }
            Packet::Ping => send_frame(write, packet::PONG).await?,
            Packet::Event { name, payload } => {
                bus.dispatch(&name, &payload.unwrap_or(Value::Null));
            }
            Packet::Close | Packet::Disconnect => return Err(ChannelError::Closed),
            Packet::Pong | Packet::Ignored => {}
        }
    }
}

async fn send_frame<W>(write: &mut W, frame: &str) -> Result<(), ChannelError>
where
    W: Sink<Message, Error = WsError> + Unpin,
{
    write
        .send(Message::Text(frame.to_string().into()))
        .await
        .map_err(|e| ChannelError::Packet(e.to_string()))
}

async fn write_loop<W>(mut write: W, mut outbound: mpsc::UnboundedReceiver<String>)
where
    W: Sink<Message, Error = WsError> + Unpin,
{
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = write.send(Message::Text(frame.into())).await {
            tracing::warn!(error = %e, "push channel write failed; stopping writer");
            break;
        }
    }
}

async fn read_loop<R>(mut read: R, bus: EventBus, outbound: mpsc::UnboundedSender<String>)
where
    R: Stream<Item = Result<Message, WsError>> + Unpin,
{
    while let Some(frame) = read.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => {
                tracing::info!("push channel closed by server");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(error = %e, "push channel read failed");
                break;
            }
        };

        match packet::decode(text.as_str()) {
            Ok(Packet::Ping) => {
                let _ = outbound.send(packet::PONG.to_string());
            }
            Ok(Packet::Event { name, payload }) => {
                let delivered = bus.dispatch(&name, &payload.unwrap_or(Value::Null));
                tracing::debug!(event = %name, delivered, "push channel event");
            }
            Ok(Packet::Close | Packet::Disconnect) => {
                tracing::info!("push channel disconnected by server");
                break;
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "skipping malformed push channel frame"),
        }
    }
    bus.close();
}
