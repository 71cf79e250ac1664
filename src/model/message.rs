use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Id;
use crate::error::FormError;

/// Message kinds known to the admin client. Anything else is kept as `Other`
/// and rendered from its generic `text` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MessageKind {
    Text,
    MultipleChoice,
    Image,
    Link,
    #[serde(other)]
    Other,
}

/// A message record exactly as the push channel delivers it: `data` is a
/// JSON document encoded as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub id: Id,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub unstructured_reply: bool,
}

/// A message with its `data` payload decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Id,
    pub kind: MessageKind,
    pub data: Value,
    pub metadata: Option<Value>,
    pub unstructured_reply: bool,
}

impl RawMessage {
    /// Decode the string-encoded `data` field. Payloads that already arrive
    /// as structured JSON are taken as-is.
    pub fn decode(self) -> Result<Message, FormError> {
        let data = match self.data {
            Value::String(encoded) => {
                serde_json::from_str(&encoded).map_err(|e| FormError::Decode {
                    id: self.id.to_string(),
                    message: e.to_string(),
                })?
            }
            other => other,
        };

        Ok(Message {
            id: self.id,
            kind: self.kind,
            data,
            metadata: self.metadata,
            unstructured_reply: self.unstructured_reply,
        })
    }
}

impl Message {
    /// Display text. What counts as "the text" depends on the message kind.
    pub fn text(&self) -> String {
        match self.kind {
            MessageKind::MultipleChoice => {
                let question = self.field("question").or_else(|| self.field("text"));
                let choices: Vec<&str> = self
                    .data
                    .get("choices")
                    .and_then(Value::as_array)
                    .map(|items| items.iter().filter_map(choice_label).collect())
                    .unwrap_or_default();
                match (question, choices.is_empty()) {
                    (Some(q), false) => format!("{q} [{}]", choices.join(" / ")),
                    (Some(q), true) => q.to_string(),
                    (None, false) => format!("[{}]", choices.join(" / ")),
                    (None, true) => String::new(),
                }
            }
            MessageKind::Image => self
                .field("caption")
                .or_else(|| self.field("url"))
                .unwrap_or_default()
                .to_string(),
            MessageKind::Link => self
                .field("title")
                .or_else(|| self.field("url"))
                .unwrap_or_default()
                .to_string(),
            MessageKind::Text | MessageKind::Other => self.field("text").map_or_else(
                || match &self.data {
                    Value::String(s) => s.clone(),
                    _ => String::new(),
                },
                str::to_string,
            ),
        }
    }

    /// Metadata rendered for option labels; empty metadata renders as nothing.
    pub fn metadata_label(&self) -> Option<String> {
        metadata_label(self.metadata.as_ref())
    }

    fn field(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

fn choice_label(choice: &Value) -> Option<&str> {
    match choice {
        Value::String(s) => Some(s.as_str()),
        Value::Object(_) => choice
            .get("label")
            .or_else(|| choice.get("text"))
            .and_then(Value::as_str),
        _ => None,
    }
}

pub(crate) fn metadata_label(metadata: Option<&Value>) -> Option<String> {
    match metadata? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) if map.is_empty() => None,
        other => Some(other.to_string()),
    }
}
