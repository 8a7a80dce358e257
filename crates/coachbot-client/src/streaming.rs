use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

use crate::buffer_utils::SseLineParser;
use crate::error::Result;

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Fragment of assistant text
    Delta {
        content: String,
    },

    /// Backend sent its end marker
    Done,
}

/// Parser for chatbot frames of the form `{"content": "<fragment>"}`.
///
/// A string `content` is taken as-is; other non-null JSON values are taken in
/// their JSON text form. A frame without `content` (or with `null`) emits
/// nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatFrameParser;

impl SseLineParser for ChatFrameParser {
    fn parse_data_line(&self, data: &str) -> std::result::Result<Option<StreamEvent>, serde_json::Error> {
        let frame: Value = serde_json::from_str(data)?;

        let content = match frame.get("content") {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        Ok(Some(StreamEvent::Delta { content }))
    }
}
