use serde::{Deserialize, Serialize};

use crate::message::MessageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Info,
    Error,
}

/// Side effects the session asks its front-end to perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Conversation view should jump to the newest message
    ScrollToBottom,

    /// Text input was consumed by a send
    InputCleared,

    /// Transient notification
    Toast {
        level: ToastLevel,
        text: String,
    },

    /// A message was prepended (user echo or assistant reply)
    MessageAdded {
        id: MessageId,
    },

    /// Older messages were appended to the end of the list
    HistoryLoaded {
        count: usize,
    },

    /// Backend has no older messages
    HistoryExhausted,
}

impl SessionEvent {
    pub fn error_toast(text: impl Into<String>) -> Self {
        Self::Toast {
            level: ToastLevel::Error,
            text: text.into(),
        }
    }
}
