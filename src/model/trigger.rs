use serde::{Deserialize, Serialize};

use super::Id;

/// What fires a trigger: a tagged reply, or any reply to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerSource {
    Tag(Id),
    Message(Id),
}

/// Body of `POST /triggers`.
///
/// Construct through [`TriggerRequest::new`] so that exactly one of the two
/// trigger fields is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    pub messages: Vec<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_tag_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_message_id: Option<Id>,
}

impl TriggerRequest {
    pub fn new(source: TriggerSource, triggered: Id) -> Self {
        let (trigger_tag_id, trigger_message_id) = match source {
            TriggerSource::Tag(id) => (Some(id), None),
            TriggerSource::Message(id) => (None, Some(id)),
        };
        Self {
            messages: vec![triggered],
            trigger_tag_id,
            trigger_message_id,
        }
    }
}

/// One entry of a select list: the record id and its rendered label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: Id,
    pub label: String,
}
