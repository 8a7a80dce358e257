use coachbot_types::{Message, MessageId, MessageStatus, Role};

/// In-memory conversation, newest message first.
///
/// Fresh messages are prepended; older history pages are appended in the
/// order the backend sent them and never re-sorted.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert as the newest message
    pub fn prepend(&mut self, message: Message) {
        self.messages.insert(0, message);
    }

    /// Add an older page after everything already loaded
    pub fn append_page(&mut self, page: Vec<Message>) {
        self.messages.extend(page);
    }

    pub fn newest(&self) -> Option<&Message> {
        self.messages.first()
    }

    /// Newest message from the assistant, wherever it sits
    pub fn newest_assistant(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.role == Role::Assistant)
    }

    pub fn oldest(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// Move a message's reveal status; returns false if the message is gone
    pub fn set_status(&mut self, id: &MessageId, status: Option<MessageStatus>) -> bool {
        match self.messages.iter_mut().find(|m| &m.id == id) {
            Some(message) => {
                message.status = status;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
