use serde::{Deserialize, Serialize};

use super::Id;

/// A labelled classification applied to replies to one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Id,
    pub message_id: Id,
    pub tag: String,
}
