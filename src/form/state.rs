use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::FormError;
use crate::model::{
    Id, Message, RawMessage, SelectOption, Tag, TriggerRequest, TriggerSource,
    format_message_info,
};

/// Outcome of the form validity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Validation {
    Success,
    Error,
}

/// The three select lists the form presents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormOptions {
    pub tags: Vec<SelectOption>,
    pub trigger_messages: Vec<SelectOption>,
    pub messages: Vec<SelectOption>,
}

/// Reference data and current selections of one trigger form.
///
/// Collections are keyed by id and only ever upserted; the selections hold
/// ids that were present in their option list when chosen.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    messages: BTreeMap<Id, Message>,
    tags: BTreeMap<Id, Tag>,
    trigger_tag: Option<Id>,
    trigger_message: Option<Id>,
    triggered_message: Option<Id>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_tags(&mut self, tags: Vec<Tag>) -> usize {
        let count = tags.len();
        for tag in tags {
            self.tags.insert(tag.id.clone(), tag);
        }
        count
    }

    /// Decode and upsert a batch of messages. Messages whose `data` cannot be
    /// decoded are skipped; the rest of the batch still applies.
    pub fn handle_messages(&mut self, messages: Vec<RawMessage>) -> usize {
        let mut applied = 0;
        for raw in messages {
            match raw.decode() {
                Ok(message) => {
                    self.messages.insert(message.id.clone(), message);
                    applied += 1;
                }
                Err(e) => tracing::warn!(error = %e, "skipping message"),
            }
        }
        applied
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    pub fn options(&self) -> FormOptions {
        let tags = self
            .tags
            .iter()
            .map(|(id, tag)| {
                let message = self.messages.get(&tag.message_id);
                let text = message.map(Message::text).unwrap_or_default();
                SelectOption {
                    value: id.clone(),
                    label: format_message_info(
                        &tag.message_id,
                        &text,
                        message.and_then(|m| m.metadata.as_ref()),
                        Some(&tag.tag),
                    ),
                }
            })
            .collect();

        let trigger_messages = self
            .messages
            .values()
            .filter(|m| m.unstructured_reply)
            .map(message_option)
            .collect();

        let messages = self.messages.values().map(message_option).collect();

        FormOptions {
            tags,
            trigger_messages,
            messages,
        }
    }

    pub fn select_tag(&mut self, tag: Option<Id>) -> Result<(), FormError> {
        if let Some(id) = &tag
            && !self.tags.contains_key(id)
        {
            return Err(FormError::UnknownTag(id.to_string()));
        }
        self.trigger_tag = tag;
        Ok(())
    }

    pub fn select_trigger_message(&mut self, message: Option<Id>) -> Result<(), FormError> {
        if let Some(id) = &message {
            match self.messages.get(id) {
                None => return Err(FormError::UnknownMessage(id.to_string())),
                Some(m) if !m.unstructured_reply => {
                    return Err(FormError::NotTriggerSource(id.to_string()));
                }
                Some(_) => {}
            }
        }
        self.trigger_message = message;
        Ok(())
    }

    pub fn select_triggered_message(&mut self, message: Option<Id>) -> Result<(), FormError> {
        if let Some(id) = &message
            && !self.messages.contains_key(id)
        {
            return Err(FormError::UnknownMessage(id.to_string()));
        }
        self.triggered_message = message;
        Ok(())
    }

    pub fn trigger_tag(&self) -> Option<&Id> {
        self.trigger_tag.as_ref()
    }

    pub fn trigger_message(&self) -> Option<&Id> {
        self.trigger_message.as_ref()
    }

    pub fn triggered_message(&self) -> Option<&Id> {
        self.triggered_message.as_ref()
    }

    /// Exactly one trigger (tag or message) plus a message to trigger.
    pub fn validate(&self) -> Validation {
        let one_trigger = self.trigger_tag.is_some() != self.trigger_message.is_some();
        if one_trigger && self.triggered_message.is_some() {
            Validation::Success
        } else {
            Validation::Error
        }
    }

    pub fn is_submittable(&self) -> bool {
        self.validate() == Validation::Success
    }

    pub fn payload(&self) -> Result<TriggerRequest, FormError> {
        if !self.is_submittable() {
            return Err(FormError::Invalid);
        }
        let source = match (&self.trigger_tag, &self.trigger_message) {
            (Some(tag), None) => TriggerSource::Tag(tag.clone()),
            (None, Some(message)) => TriggerSource::Message(message.clone()),
            _ => return Err(FormError::Invalid),
        };
        let triggered = self.triggered_message.clone().ok_or(FormError::Invalid)?;
        Ok(TriggerRequest::new(source, triggered))
    }
}

fn message_option(message: &Message) -> SelectOption {
    SelectOption {
        value: message.id.clone(),
        label: format_message_info(
            &message.id,
            &message.text(),
            message.metadata.as_ref(),
            None,
        ),
    }
}
