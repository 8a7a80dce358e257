// Connection settings for the chatbot backend

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ClientError, Result};

pub const DEFAULT_CHAT_PATH: &str = "/v1/chatbot/chat";
pub const DEFAULT_HISTORY_PATH: &str = "/v1/chatbot/messages";
pub const DEFAULT_GREETINGS_PATH: &str = "/v1/chatbot/greetings";

fn default_chat_path() -> String {
    DEFAULT_CHAT_PATH.to_string()
}

fn default_history_path() -> String {
    DEFAULT_HISTORY_PATH.to_string()
}

fn default_greetings_path() -> String {
    DEFAULT_GREETINGS_PATH.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Where the backend lives and how to talk to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL, e.g. "https://api.example.com"
    pub base_url: String,
    #[serde(default = "default_chat_path")]
    pub chat_path: String,
    #[serde(default = "default_history_path")]
    pub history_path: String,
    #[serde(default = "default_greetings_path")]
    pub greetings_path: String,
    /// Timeout for history and greeting requests. Chat streams are unbounded.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Bearer token, if the backend wants one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            chat_path: default_chat_path(),
            history_path: default_history_path(),
            greetings_path: default_greetings_path(),
            timeout_secs: default_timeout_secs(),
            api_token: None,
        }
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_history_path(mut self, path: impl Into<String>) -> Self {
        self.history_path = path.into();
        self
    }

    pub fn with_greetings_path(mut self, path: impl Into<String>) -> Self {
        self.greetings_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Join the base URL with an endpoint path
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(ClientError::InvalidConfig("Base URL is required".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ClientError::InvalidConfig(format!(
                "Base URL must start with http:// or https://, got {}",
                base
            )));
        }
        Ok(())
    }
}
