use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::reveal::RevealPolicy;

/// Tunables for a chat session. Missing fields fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub history_page_size: u32,
    pub greeting_page_size: u32,
    /// Quiet period before a greeting search is sent, in milliseconds
    #[serde(rename = "search_debounce_ms", with = "crate::reveal::millis")]
    pub search_debounce: Duration,
    pub reveal: RevealPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_page_size: 10,
            greeting_page_size: 10,
            search_debounce: Duration::from_millis(800),
            reveal: RevealPolicy::default(),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_page_size(mut self, size: u32) -> Self {
        self.history_page_size = size;
        self
    }

    pub fn with_greeting_page_size(mut self, size: u32) -> Self {
        self.greeting_page_size = size;
        self
    }

    pub fn with_search_debounce(mut self, window: Duration) -> Self {
        self.search_debounce = window;
        self
    }

    pub fn with_reveal(mut self, policy: RevealPolicy) -> Self {
        self.reveal = policy;
        self
    }
}
