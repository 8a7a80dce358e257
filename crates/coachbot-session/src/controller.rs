//! Session controller: the single owner of the visible conversation.
//!
//! The controller is a cheap `Clone` handle. State lives behind a
//! `std::sync::Mutex` that is never held across an `.await`, so a reply
//! stream and a history fetch can run side by side: replies are prepended,
//! history is appended.
//!
//! Every operation captures the current `Generation` when it starts: the
//! cancellation token together with the history and greeting re-entrancy
//! flags. After each suspension point the token is checked while holding the
//! relevant lock, so work that outlives [`SessionController::reset`] or
//! [`SessionController::shutdown`] never touches the new state. `reset()`
//! swaps in a fresh generation, so a cancelled request that has not yet been
//! polled to completion cannot block the first request of the new one.

use coachbot_client::{ChatBackend, ChatRequest};
use coachbot_types::{now_display, Greeting, Message, MessageId, MessageStatus, Role, SessionEvent};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::assembler::StreamAssembler;
use crate::config::SessionConfig;
use crate::debounce::QueryDebouncer;
use crate::followup::{extract_follow_ups, option_payload, FollowUp};
use crate::greetings::{GreetingFetch, GreetingSearch};
use crate::ids::generate_local_id;
use crate::paginator::{HistoryCursor, HistoryPaginator, PageOutcome};
use crate::store::MessageStore;

const SEND_FAILED_TOAST: &str = "Message could not be sent. Tap retry to try again.";
const GREETINGS_FAILED_TOAST: &str = "Could not load suggestions.";

/// Who is chatting. Injected at construction, never looked up globally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: String,
}

impl SessionIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.user_id.trim().is_empty()
    }
}

/// Where a send came from; decides what text is used and whether the input
/// field is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOrigin {
    /// Typed by the user; clears the input field
    Input,
    /// Follow-up option or greeting click; input field untouched
    FollowUp,
    /// Retry of the newest message; nothing new is inserted
    Resend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Precondition not met (typing, no identity, nothing to send)
    Ignored,
    Delivered {
        /// The echoed user message; None for a resend
        user: Option<MessageId>,
        reply: MessageId,
    },
    /// Backend or stream failure; `flagged` carries the retry affordance
    Failed { flagged: MessageId },
    Cancelled,
}

#[derive(Debug, Default)]
struct SessionState {
    store: MessageStore,
    is_typing_bot: bool,
    is_loading: bool,
    is_loading_messages: bool,
    fetch_error: bool,
    id_of_message_got_error: Option<MessageId>,
    cursor: HistoryCursor,
    draft: String,
}

/// Read-only copy of the session for rendering
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub messages: Vec<Message>,
    pub is_typing_bot: bool,
    pub is_loading: bool,
    pub is_loading_messages: bool,
    pub fetch_error: bool,
    pub id_of_message_got_error: Option<MessageId>,
    pub cursor: HistoryCursor,
    pub draft: String,
}

/// One chat bubble as it should be drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: MessageId,
    pub role: Role,
    pub body: String,
    /// Only ever non-empty for the newest assistant message
    pub options: Vec<String>,
    pub created_at: String,
    pub status: Option<MessageStatus>,
    /// This message carries the retry button
    pub failed: bool,
}

/// Everything `reset()` replaces wholesale
struct Generation {
    cancel: CancellationToken,
    paginator: HistoryPaginator,
    greetings: Arc<GreetingSearch>,
}

impl Generation {
    fn new(config: &SessionConfig) -> Self {
        Self {
            cancel: CancellationToken::new(),
            paginator: HistoryPaginator::new(config.history_page_size),
            greetings: Arc::new(GreetingSearch::new(config.greeting_page_size)),
        }
    }
}

struct Inner {
    backend: Arc<dyn ChatBackend>,
    identity: SessionIdentity,
    config: SessionConfig,
    state: Mutex<SessionState>,
    generation: Mutex<Arc<Generation>>,
    debouncer: Mutex<Option<QueryDebouncer>>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    /// Create a session and the receiver for its UI side effects
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        identity: SessionIdentity,
        config: SessionConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();

        let inner = Inner {
            backend,
            generation: Mutex::new(Arc::new(Generation::new(&config))),
            identity,
            config,
            state: Mutex::new(SessionState::default()),
            debouncer: Mutex::new(None),
            events,
        };

        (Self { inner: Arc::new(inner) }, rx)
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.inner.identity
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            messages: state.store.as_slice().to_vec(),
            is_typing_bot: state.is_typing_bot,
            is_loading: state.is_loading,
            is_loading_messages: state.is_loading_messages,
            fetch_error: state.fetch_error,
            id_of_message_got_error: state.id_of_message_got_error.clone(),
            cursor: state.cursor.clone(),
            draft: state.draft.clone(),
        }
    }

    /// Mirror of the text input field
    pub fn set_draft(&self, text: impl Into<String>) {
        self.lock().draft = text.into();
    }

    pub fn draft(&self) -> String {
        self.lock().draft.clone()
    }

    // ------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------

    /// Send `text` (or the current draft when `None`) and stream the reply.
    ///
    /// Ignored while a reply is still streaming. With [`SendOrigin::Resend`]
    /// the newest message's content is sent again and `text` is ignored.
    pub async fn send_message(&self, text: Option<String>, origin: SendOrigin) -> SendOutcome {
        self.dispatch(text, None, origin).await
    }

    /// Send a follow-up option exactly as the backend encoded it
    pub async fn select_follow_up(&self, label: &str) -> SendOutcome {
        self.dispatch(Some(option_payload(label)), None, SendOrigin::FollowUp)
            .await
    }

    /// Show the greeting's text, send its prompt
    pub async fn select_greeting(&self, greeting: &Greeting) -> SendOutcome {
        self.dispatch(
            Some(greeting.message.clone()),
            Some(greeting.outgoing_text().to_string()),
            SendOrigin::FollowUp,
        )
        .await
    }

    async fn dispatch(
        &self,
        text: Option<String>,
        wire_text: Option<String>,
        origin: SendOrigin,
    ) -> SendOutcome {
        if !self.inner.identity.is_valid() {
            tracing::warn!("Send attempted without a user identity");
            return SendOutcome::Ignored;
        }

        let token = self.token();
        if token.is_cancelled() {
            return SendOutcome::Cancelled;
        }

        let mut pending_events = Vec::new();

        let (message_text, flagged, user_id) = {
            let mut state = self.lock();
            if state.is_typing_bot {
                tracing::debug!("Reply still streaming; send ignored");
                return SendOutcome::Ignored;
            }

            let prepared = match origin {
                SendOrigin::Resend => match state.store.newest() {
                    Some(newest) => (newest.content.clone(), newest.id.clone(), None),
                    None => return SendOutcome::Ignored,
                },
                SendOrigin::Input | SendOrigin::FollowUp => {
                    let text = text.unwrap_or_else(|| state.draft.clone());
                    if text.trim().is_empty() {
                        return SendOutcome::Ignored;
                    }

                    let message = Message::user(generate_local_id(), text.clone(), now_display());
                    let id = message.id.clone();
                    state.store.prepend(message);
                    pending_events.push(SessionEvent::MessageAdded { id: id.clone() });

                    if origin == SendOrigin::Input {
                        state.draft.clear();
                        pending_events.push(SessionEvent::InputCleared);
                    }

                    (wire_text.unwrap_or(text), id.clone(), Some(id))
                }
            };

            state.is_typing_bot = true;
            state.is_loading = true;
            state.id_of_message_got_error = None;
            prepared
        };

        pending_events.push(SessionEvent::ScrollToBottom);
        self.emit_all(pending_events);

        tracing::info!(origin = ?origin, chars = message_text.len(), "Sending chat message");
        let request = ChatRequest::new(self.inner.identity.user_id.clone(), message_text);

        let result = tokio::select! {
            _ = token.cancelled() => return SendOutcome::Cancelled,
            result = self.stream_reply(request) => result,
        };

        let mut state = self.lock();
        if token.is_cancelled() {
            return SendOutcome::Cancelled;
        }
        state.is_typing_bot = false;
        state.is_loading = false;

        match result {
            Ok(content) => {
                let reply = Message::fresh_reply(generate_local_id(), content, now_display());
                let reply_id = reply.id.clone();
                state.store.prepend(reply);
                drop(state);

                self.emit_all(vec![
                    SessionEvent::MessageAdded { id: reply_id.clone() },
                    SessionEvent::ScrollToBottom,
                ]);
                SendOutcome::Delivered {
                    user: user_id,
                    reply: reply_id,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, flagged = %flagged, "Chat request failed");
                state.id_of_message_got_error = Some(flagged.clone());
                drop(state);

                self.emit(SessionEvent::error_toast(SEND_FAILED_TOAST));
                SendOutcome::Failed { flagged }
            }
        }
    }

    async fn stream_reply(&self, request: ChatRequest) -> coachbot_client::Result<String> {
        let stream = self.inner.backend.chat_stream(request).await?;
        StreamAssembler::collect(stream).await
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Fetch the next page of older messages and append it.
    ///
    /// At most one history request runs at a time; extra calls return
    /// [`PageOutcome::Skipped`]. Once the backend returns an empty page
    /// every later call is skipped.
    pub async fn get_messages(&self) -> PageOutcome {
        if !self.inner.identity.is_valid() {
            return PageOutcome::Skipped;
        }

        let generation = self.generation();
        let Some(_in_flight) = generation.paginator.try_begin() else {
            return PageOutcome::Skipped;
        };

        let token = generation.cancel.clone();

        let query = {
            let mut state = self.lock();
            if token.is_cancelled() {
                return PageOutcome::Cancelled;
            }
            match generation
                .paginator
                .query_for(&self.inner.identity.user_id, &state.cursor)
            {
                Some(query) => {
                    state.is_loading_messages = true;
                    query
                }
                None => return PageOutcome::Skipped,
            }
        };

        let result = tokio::select! {
            _ = token.cancelled() => return PageOutcome::Cancelled,
            result = self.inner.backend.list_messages(query) => result,
        };

        let mut state = self.lock();
        if token.is_cancelled() {
            return PageOutcome::Cancelled;
        }
        state.is_loading_messages = false;

        match result {
            Ok(page) => {
                let outcome = HistoryPaginator::advance(&mut state.cursor, &page);
                state.store.append_page(page);
                drop(state);

                match outcome {
                    PageOutcome::Loaded(count) => {
                        tracing::debug!(count, "History page appended");
                        self.emit(SessionEvent::HistoryLoaded { count });
                    }
                    PageOutcome::Exhausted => {
                        tracing::debug!("History exhausted");
                        self.emit(SessionEvent::HistoryExhausted);
                    }
                    _ => {}
                }
                outcome
            }
            Err(e) => {
                tracing::warn!(error = %e, "History fetch failed");
                state.fetch_error = true;
                PageOutcome::Failed
            }
        }
    }

    /// Auto-paging trigger for the sentinel at the top of the list.
    /// Does nothing while a previous failure is unacknowledged.
    pub async fn on_history_sentinel_visible(&self) -> PageOutcome {
        if self.lock().fetch_error {
            return PageOutcome::Skipped;
        }
        self.get_messages().await
    }

    /// Retry button: clear the failure and fetch again
    pub async fn retry_history(&self) -> PageOutcome {
        self.lock().fetch_error = false;
        self.get_messages().await
    }

    // ------------------------------------------------------------------
    // Greetings
    // ------------------------------------------------------------------

    pub async fn fetch_greetings(&self, query: Option<String>, load_more: bool) -> GreetingFetch {
        let generation = self.generation();
        let token = &generation.cancel;
        if token.is_cancelled() {
            return GreetingFetch::Cancelled;
        }

        let search = generation
            .greetings
            .fetch(self.inner.backend.as_ref(), query, load_more, token);
        let outcome = tokio::select! {
            _ = token.cancelled() => return GreetingFetch::Cancelled,
            outcome = search => outcome,
        };

        if let GreetingFetch::Failed(_) = &outcome {
            self.emit(SessionEvent::error_toast(GREETINGS_FAILED_TOAST));
        }
        outcome
    }

    /// Feed a keystroke from the greeting search box.
    ///
    /// Must be called from within a tokio runtime: the debounce task is
    /// spawned on first use.
    pub fn greeting_input(&self, query: impl Into<String>) {
        let mut slot = self
            .inner
            .debouncer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let debouncer = slot.get_or_insert_with(|| {
            let weak = Arc::downgrade(&self.inner);
            QueryDebouncer::spawn(self.inner.config.search_debounce, move |query| {
                let weak = weak.clone();
                async move {
                    if let Some(inner) = weak.upgrade() {
                        SessionController { inner }
                            .fetch_greetings(Some(query), false)
                            .await;
                    }
                }
            })
        });

        debouncer.push(query);
    }

    /// Greeting list of the current conversation
    pub fn greetings(&self) -> Arc<GreetingSearch> {
        self.generation().greetings.clone()
    }

    // ------------------------------------------------------------------
    // Rendering helpers
    // ------------------------------------------------------------------

    /// Options offered by the newest assistant message, if any
    pub fn quick_replies(&self) -> Option<FollowUp> {
        let state = self.lock();
        let newest = state.store.newest_assistant()?;
        let follow_up = extract_follow_ups(&newest.content);
        follow_up.has_options().then_some(follow_up)
    }

    /// Bubbles newest first. Only the newest assistant message is split into
    /// body and options; older ones render their content untouched.
    pub fn message_views(&self) -> Vec<MessageView> {
        let state = self.lock();
        let newest_assistant = state.store.newest_assistant().map(|m| m.id.clone());

        state
            .store
            .iter()
            .map(|message| {
                let (body, options) = if newest_assistant.as_ref() == Some(&message.id) {
                    let follow_up = extract_follow_ups(&message.content);
                    (follow_up.body, follow_up.options)
                } else {
                    (message.content.clone(), Vec::new())
                };

                MessageView {
                    id: message.id.clone(),
                    role: message.role,
                    body,
                    options,
                    created_at: message.created_at.clone(),
                    status: message.status,
                    failed: state.id_of_message_got_error.as_ref() == Some(&message.id),
                }
            })
            .collect()
    }

    /// `IsNew -> IsTyping`; false if the message is not awaiting reveal
    pub fn begin_reveal(&self, id: &MessageId) -> bool {
        let mut state = self.lock();
        let revealable = state.store.get(id).is_some_and(|m| m.is_revealable());
        revealable && state.store.set_status(id, Some(MessageStatus::IsTyping))
    }

    /// Mark a reply as fully shown
    pub fn finish_reveal(&self, id: &MessageId) -> bool {
        self.lock().store.set_status(id, None)
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Cancel everything in flight. The session stays inert afterwards.
    pub fn shutdown(&self) {
        tracing::debug!("Session shutting down");
        self.token().cancel();
        self.take_debouncer();
    }

    pub fn is_shut_down(&self) -> bool {
        self.token().is_cancelled()
    }

    /// Cancel in-flight work and start over with an empty conversation
    pub fn reset(&self) {
        let previous = {
            let mut slot = self
                .inner
                .generation
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::replace(&mut *slot, Arc::new(Generation::new(&self.inner.config)))
        };
        previous.cancel.cancel();

        *self.lock() = SessionState::default();
        self.take_debouncer();
    }

    fn take_debouncer(&self) {
        self.inner
            .debouncer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
    }

    fn generation(&self) -> Arc<Generation> {
        self.inner
            .generation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn token(&self) -> CancellationToken {
        self.generation().cancel.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: SessionEvent) {
        // Receiver gone means the front-end is gone; nothing to do
        let _ = self.inner.events.send(event);
    }

    fn emit_all(&self, events: Vec<SessionEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}
