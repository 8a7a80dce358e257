use async_trait::async_trait;
use coachbot_types::{Greeting, Message};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::streaming::EventStream;

/// Everything the chat session needs from the backend.
///
/// The HTTP implementation lives in [`crate::http::HttpBackend`]; tests plug
/// in their own.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Post a user message and stream the assistant reply
    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream>;

    /// One page of conversation history, newest first
    async fn list_messages(&self, query: HistoryQuery) -> Result<Vec<Message>>;

    /// One page of canned greetings
    async fn list_greetings(&self, query: GreetingQuery) -> Result<GreetingPage>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
}

impl ChatRequest {
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub user_id: String,
    pub limit: u32,
    pub order: SortOrder,
    /// Raw ID of the oldest message already seen
    pub after_id: Option<String>,
}

impl HistoryQuery {
    pub fn new(user_id: impl Into<String>, limit: u32) -> Self {
        Self {
            user_id: user_id.into(),
            limit,
            order: SortOrder::Desc,
            after_id: None,
        }
    }

    pub fn after(mut self, after_id: impl Into<String>) -> Self {
        self.after_id = Some(after_id.into());
        self
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("user_id", self.user_id.clone()),
            ("limit", self.limit.to_string()),
            ("order", self.order.as_str().to_string()),
        ];
        if let Some(after_id) = &self.after_id {
            params.push(("after_id", after_id.clone()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetingQuery {
    pub active: bool,
    pub query: Option<String>,
    pub per_page: u32,
    /// 1-based page number
    pub page: u32,
}

impl GreetingQuery {
    pub fn new(per_page: u32, page: u32) -> Self {
        Self {
            active: true,
            query: None,
            per_page,
            page,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.query = if query.trim().is_empty() { None } else { Some(query) };
        self
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("active", self.active.to_string())];
        if let Some(query) = &self.query {
            params.push(("query", query.clone()));
        }
        params.push(("per_page", self.per_page.to_string()));
        params.push(("page", self.page.to_string()));
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GreetingPage {
    pub greetings: Vec<Greeting>,
    /// Total matches across all pages
    pub total: u64,
}
