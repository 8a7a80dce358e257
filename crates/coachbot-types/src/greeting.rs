use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GreetingStatus {
    #[default]
    Active,
    Inactive,
}

/// Canned prompt offered in the suggestion popover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    pub id: String,
    /// Text shown to the user
    pub message: String,
    /// Instruction actually sent to the backend when picked
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub status: GreetingStatus,
}

impl Greeting {
    pub fn new(id: impl Into<String>, message: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            prompt: prompt.into(),
            status: GreetingStatus::Active,
        }
    }

    /// What goes over the wire when this greeting is picked
    pub fn outgoing_text(&self) -> &str {
        if self.prompt.trim().is_empty() {
            &self.message
        } else {
            &self.prompt
        }
    }
}
