mod id;
mod message;
mod tag;
mod trigger;

pub use id::Id;
pub use message::{Message, MessageKind, RawMessage};
pub use tag::Tag;
pub use trigger::{SelectOption, TriggerRequest, TriggerSource};

use serde_json::Value;

/// Render the label for a message option, optionally scoped to a tag value.
///
/// `#12: Are you coming? (week 1)` for a message,
/// `#12: Are you coming? (week 1) [yes]` for a tag on that message.
pub fn format_message_info(
    message_id: &Id,
    text: &str,
    metadata: Option<&Value>,
    tag: Option<&str>,
) -> String {
    let mut label = format!("#{message_id}: {text}");
    if let Some(meta) = message::metadata_label(metadata) {
        label.push_str(&format!(" ({meta})"));
    }
    if let Some(tag) = tag {
        label.push_str(&format!(" [{tag}]"));
    }
    label
}
