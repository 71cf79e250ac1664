//! Text framing for the push channel.
//!
//! The server speaks Socket.IO v4 over the Engine.IO v4 WebSocket transport.
//! Every text frame starts with an Engine.IO packet type digit; `4` frames
//! carry a Socket.IO packet whose first digit is its own type:
//!
//! ```text
//! 0{"sid":"..","pingInterval":25000}   engine open
//! 2 / 3                                engine ping / pong
//! 40 / 40{"sid":".."}                  namespace connect (request / ack)
//! 42["tags",[...]]                     event with payload
//! 42/admin,17["get-tags"]              event in a namespace, with ack id
//! 44{"message":"not authorized"}       namespace connect error
//! ```

use serde_json::Value;

use crate::error::ChannelError;

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(Value),
    Close,
    Ping,
    Pong,
    Connect(Option<Value>),
    Disconnect,
    Event {
        name: String,
        payload: Option<Value>,
    },
    ConnectError(Value),
    /// Engine upgrade / noop frames and Socket.IO acks; nothing to act on.
    Ignored,
}

/// Client request to join the default namespace.
pub const CONNECT: &str = "40";
/// Reply to an engine ping.
pub const PONG: &str = "3";

pub fn encode_event(name: &str, payload: Option<&Value>) -> String {
    let frame = match payload {
        Some(payload) => Value::Array(vec![Value::String(name.to_string()), payload.clone()]),
        None => Value::Array(vec![Value::String(name.to_string())]),
    };
    format!("42{frame}")
}

pub fn decode(frame: &str) -> Result<Packet, ChannelError> {
    let mut chars = frame.chars();
    let engine_type = chars
        .next()
        .ok_or_else(|| ChannelError::Packet("empty frame".into()))?;
    let rest = chars.as_str();

    match engine_type {
        '0' => Ok(Packet::Open(parse_json(rest)?)),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '4' => decode_socket(rest),
        '5' | '6' => Ok(Packet::Ignored),
        other => Err(ChannelError::Packet(format!(
            "unknown engine packet type {other:?}"
        ))),
    }
}

fn decode_socket(body: &str) -> Result<Packet, ChannelError> {
    let mut chars = body.chars();
    let socket_type = chars
        .next()
        .ok_or_else(|| ChannelError::Packet("empty message packet".into()))?;
    let rest = skip_ack_id(skip_namespace(chars.as_str()));

    match socket_type {
        '0' => Ok(Packet::Connect(if rest.is_empty() {
            None
        } else {
            Some(parse_json(rest)?)
        })),
        '1' => Ok(Packet::Disconnect),
        '2' => decode_event(rest),
        '3' | '5' | '6' => Ok(Packet::Ignored),
        '4' => Ok(Packet::ConnectError(if rest.is_empty() {
            Value::Null
        } else {
            parse_json(rest)?
        })),
        other => Err(ChannelError::Packet(format!(
            "unknown socket packet type {other:?}"
        ))),
    }
}

fn decode_event(body: &str) -> Result<Packet, ChannelError> {
    let Value::Array(mut items) = parse_json(body)? else {
        return Err(ChannelError::Packet("event body is not an array".into()));
    };
    if items.is_empty() {
        return Err(ChannelError::Packet("event without a name".into()));
    }
    let Value::String(name) = items.remove(0) else {
        return Err(ChannelError::Packet("event name is not a string".into()));
    };
    // Extra arguments beyond the first are not used by any event we consume.
    let payload = if items.is_empty() {
        None
    } else {
        Some(items.swap_remove(0))
    };
    Ok(Packet::Event { name, payload })
}

fn skip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        body.split_once(',').map_or("", |(_, rest)| rest)
    } else {
        body
    }
}

fn skip_ack_id(body: &str) -> &str {
    body.trim_start_matches(|c: char| c.is_ascii_digit())
}

fn parse_json(body: &str) -> Result<Value, ChannelError> {
    serde_json::from_str(body).map_err(|e| ChannelError::Packet(e.to_string()))
}
