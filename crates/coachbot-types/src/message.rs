use serde::{Deserialize, Serialize};
use std::fmt;

/// Message identifier, tagged by where it was minted.
///
/// Client-generated IDs and server-assigned IDs live in separate spaces: a
/// `Local("42")` never equals a `Remote("42")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageId {
    /// Minted by this client for optimistic inserts
    Local(String),
    /// Assigned by the backend, only seen on fetched history
    Remote(String),
}

impl MessageId {
    pub fn local(raw: impl Into<String>) -> Self {
        Self::Local(raw.into())
    }

    pub fn remote(raw: impl Into<String>) -> Self {
        Self::Remote(raw.into())
    }

    /// Raw identifier without the origin tag
    pub fn as_str(&self) -> &str {
        match self {
            Self::Local(raw) | Self::Remote(raw) => raw,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(raw) => write!(f, "local:{}", raw),
            Self::Remote(raw) => write!(f, "remote:{}", raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
}

/// Reveal lifecycle of a freshly streamed assistant message.
///
/// A message with no status is finalized and renders in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    IsNew,
    IsTyping,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub content_type: ContentType,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MessageStatus>,
}

impl Message {
    /// User message stamped with the given display time
    pub fn user(id: MessageId, content: impl Into<String>, at: impl Into<String>) -> Self {
        let at = at.into();
        Self {
            id,
            role: Role::User,
            content: content.into(),
            content_type: ContentType::Text,
            created_at: at.clone(),
            updated_at: at,
            status: None,
        }
    }

    /// Assistant message that just finished streaming, eligible for reveal
    pub fn fresh_reply(id: MessageId, content: impl Into<String>, at: impl Into<String>) -> Self {
        let at = at.into();
        Self {
            id,
            role: Role::Assistant,
            content: content.into(),
            content_type: ContentType::Text,
            created_at: at.clone(),
            updated_at: at,
            status: Some(MessageStatus::IsNew),
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    pub fn is_revealable(&self) -> bool {
        self.status == Some(MessageStatus::IsNew)
    }
}
