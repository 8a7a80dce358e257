#![allow(dead_code)]

use async_trait::async_trait;
use coachbot_client::{
    parse_sse_stream, ChatBackend, ChatFrameParser, ChatRequest, ClientError, EventStream,
    GreetingPage, GreetingQuery, HistoryQuery, Result,
};
use coachbot_types::{Greeting, Message, MessageId, Role};
use futures::stream;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

/// Scripted reply for one chat call
pub enum ChatScript {
    /// SSE chunks delivered as-is
    Frames(Vec<String>),
    /// Backend refuses the request
    Unavailable,
    /// Some frames, then the connection drops
    DropsAfter(Vec<String>),
}

impl ChatScript {
    /// One frame per delta, followed by `[DONE]`
    pub fn reply(deltas: &[&str]) -> Self {
        let mut frames: Vec<String> = deltas
            .iter()
            .map(|delta| format!("data: {}\n\n", serde_json::json!({ "content": delta })))
            .collect();
        frames.push("data: [DONE]\n\n".to_string());
        ChatScript::Frames(frames)
    }
}

/// In-memory backend that records every call
#[derive(Default)]
pub struct MockBackend {
    chat_script: Mutex<VecDeque<ChatScript>>,
    history_pages: Mutex<VecDeque<Option<Vec<Message>>>>,
    greeting_pages: Mutex<VecDeque<Option<GreetingPage>>>,
    pub chat_calls: Mutex<Vec<ChatRequest>>,
    pub history_calls: Mutex<Vec<HistoryQuery>>,
    pub greeting_calls: Mutex<Vec<GreetingQuery>>,
    delay: Option<Duration>,
    call_delays: Mutex<VecDeque<Duration>>,
    gate: Option<Notify>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay for the next call only; falls back to `with_delay` afterwards
    pub fn with_call_delay(self, delay: Duration) -> Self {
        self.call_delays.lock().unwrap().push_back(delay);
        self
    }

    /// Every call blocks until [`MockBackend::release`]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Notify::new());
        self
    }

    /// Let one gated call through
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn with_chat(self, script: ChatScript) -> Self {
        self.chat_script.lock().unwrap().push_back(script);
        self
    }

    pub fn with_history_page(self, page: Vec<Message>) -> Self {
        self.history_pages.lock().unwrap().push_back(Some(page));
        self
    }

    pub fn with_history_failure(self) -> Self {
        self.history_pages.lock().unwrap().push_back(None);
        self
    }

    pub fn with_greeting_page(self, greetings: Vec<Greeting>, total: u64) -> Self {
        self.greeting_pages
            .lock()
            .unwrap()
            .push_back(Some(GreetingPage { greetings, total }));
        self
    }

    pub fn with_greeting_failure(self) -> Self {
        self.greeting_pages.lock().unwrap().push_back(None);
        self
    }

    pub fn chat_messages(&self) -> Vec<String> {
        self.chat_calls
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.message.clone())
            .collect()
    }

    pub fn history_queries(&self) -> Vec<HistoryQuery> {
        self.history_calls.lock().unwrap().clone()
    }

    pub fn greeting_queries(&self) -> Vec<GreetingQuery> {
        self.greeting_calls.lock().unwrap().clone()
    }

    async fn pause(&self) {
        let delay = self.call_delays.lock().unwrap().pop_front().or(self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

fn unavailable() -> ClientError {
    ClientError::Status {
        status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        body: "maintenance".to_string(),
    }
}

fn frames_to_stream(frames: Vec<String>, drop_at_end: bool) -> EventStream {
    let mut chunks: Vec<std::result::Result<Vec<u8>, std::io::Error>> =
        frames.into_iter().map(|frame| Ok(frame.into_bytes())).collect();
    if drop_at_end {
        chunks.push(Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset",
        )));
    }
    parse_sse_stream(stream::iter(chunks), ChatFrameParser)
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        self.chat_calls.lock().unwrap().push(request);
        self.pause().await;

        let script = self.chat_script.lock().unwrap().pop_front();
        match script {
            Some(ChatScript::Frames(frames)) => Ok(frames_to_stream(frames, false)),
            Some(ChatScript::DropsAfter(frames)) => Ok(frames_to_stream(frames, true)),
            Some(ChatScript::Unavailable) | None => Err(unavailable()),
        }
    }

    async fn list_messages(&self, query: HistoryQuery) -> Result<Vec<Message>> {
        self.history_calls.lock().unwrap().push(query);
        self.pause().await;

        match self.history_pages.lock().unwrap().pop_front() {
            Some(Some(page)) => Ok(page),
            Some(None) => Err(unavailable()),
            None => Ok(Vec::new()),
        }
    }

    async fn list_greetings(&self, query: GreetingQuery) -> Result<GreetingPage> {
        self.greeting_calls.lock().unwrap().push(query);
        self.pause().await;

        match self.greeting_pages.lock().unwrap().pop_front() {
            Some(Some(page)) => Ok(page),
            Some(None) => Err(unavailable()),
            None => Ok(GreetingPage::default()),
        }
    }
}

/// Server-side message with a remote ID
pub fn remote(id: &str, role: Role, content: &str) -> Message {
    Message {
        id: MessageId::remote(id),
        role,
        content: content.to_string(),
        content_type: Default::default(),
        created_at: "01/03/2025 09:00".to_string(),
        updated_at: "01/03/2025 09:00".to_string(),
        status: None,
    }
}

pub fn greeting(id: &str, message: &str) -> Greeting {
    Greeting::new(id, message, "")
}
