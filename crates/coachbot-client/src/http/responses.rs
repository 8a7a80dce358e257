// Backend response envelopes and their conversion into client types

use coachbot_types::{format_server_timestamp, ContentType, Greeting, GreetingStatus, Message, MessageId, Role};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Paging {
    #[serde(default)]
    pub total: u64,
}

/// IDs arrive as numbers from some endpoints and strings from others
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoteMessage {
    pub id: RawId,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl From<RemoteMessage> for Message {
    fn from(remote: RemoteMessage) -> Self {
        let created_at = remote
            .created_at
            .as_deref()
            .map(format_server_timestamp)
            .unwrap_or_default();
        let updated_at = remote
            .updated_at
            .as_deref()
            .map(format_server_timestamp)
            .unwrap_or_else(|| created_at.clone());

        Message {
            id: MessageId::remote(remote.id.into_string()),
            role: remote.role,
            content: remote.content,
            content_type: remote.content_type,
            created_at,
            updated_at,
            status: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoteGreeting {
    pub id: RawId,
    pub message: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub status: GreetingStatus,
}

impl From<RemoteGreeting> for Greeting {
    fn from(remote: RemoteGreeting) -> Self {
        Greeting {
            id: remote.id.into_string(),
            message: remote.message,
            prompt: remote.prompt,
            status: remote.status,
        }
    }
}
