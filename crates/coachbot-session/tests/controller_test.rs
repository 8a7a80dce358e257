mod common;

use coachbot_session::{
    GreetingFetch, HistoryCursor, PageOutcome, SendOrigin, SendOutcome, SessionConfig,
    SessionController, SessionIdentity,
};
use coachbot_types::{Greeting, MessageId, MessageStatus, Role, SessionEvent, ToastLevel};
use common::{greeting, remote, ChatScript, MockBackend};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

fn session(backend: &Arc<MockBackend>) -> (SessionController, UnboundedReceiver<SessionEvent>) {
    SessionController::new(
        backend.clone(),
        SessionIdentity::new("user-42"),
        SessionConfig::default(),
    )
}

fn drain(rx: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_send_streams_reply_and_prepends() {
    let backend = Arc::new(MockBackend::new().with_chat(ChatScript::reply(&["Hel", "lo ", "there"])));
    let (controller, mut rx) = session(&backend);

    controller.set_draft("hi coach");
    let outcome = controller.send_message(None, SendOrigin::Input).await;

    let SendOutcome::Delivered { user: Some(user_id), reply } = outcome else {
        panic!("expected delivery");
    };
    assert!(user_id.is_local());
    assert!(reply.is_local());

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.messages.len(), 2);
    assert_eq!(snapshot.messages[0].id, reply);
    assert_eq!(snapshot.messages[0].role, Role::Assistant);
    assert_eq!(snapshot.messages[0].content, "Hello there");
    assert_eq!(snapshot.messages[0].status, Some(MessageStatus::IsNew));
    assert_eq!(snapshot.messages[1].content, "hi coach");
    assert_eq!(snapshot.draft, "");
    assert!(!snapshot.is_typing_bot);
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.id_of_message_got_error, None);

    assert_eq!(backend.chat_messages(), vec!["hi coach"]);
    assert_eq!(
        drain(&mut rx),
        vec![
            SessionEvent::MessageAdded { id: user_id },
            SessionEvent::InputCleared,
            SessionEvent::ScrollToBottom,
            SessionEvent::MessageAdded { id: reply },
            SessionEvent::ScrollToBottom,
        ]
    );
}

#[tokio::test]
async fn test_blank_text_is_ignored() {
    let backend = Arc::new(MockBackend::new());
    let (controller, _rx) = session(&backend);

    let outcome = controller
        .send_message(Some("   \n".to_string()), SendOrigin::Input)
        .await;

    assert_eq!(outcome, SendOutcome::Ignored);
    assert!(controller.snapshot().messages.is_empty());
    assert!(backend.chat_messages().is_empty());
}

#[tokio::test]
async fn test_missing_identity_is_ignored() {
    let backend = Arc::new(MockBackend::new().with_chat(ChatScript::reply(&["unused"])));
    let (controller, _rx) =
        SessionController::new(backend.clone(), SessionIdentity::new(""), SessionConfig::default());

    let outcome = controller
        .send_message(Some("hello".to_string()), SendOrigin::Input)
        .await;

    assert_eq!(outcome, SendOutcome::Ignored);
    assert_eq!(controller.get_messages().await, PageOutcome::Skipped);
    assert!(backend.chat_messages().is_empty());
    assert!(backend.history_queries().is_empty());
}

#[tokio::test]
async fn test_failed_send_flags_user_message() {
    let backend = Arc::new(MockBackend::new().with_chat(ChatScript::Unavailable));
    let (controller, mut rx) = session(&backend);

    let outcome = controller
        .send_message(Some("how much protein?".to_string()), SendOrigin::Input)
        .await;

    let SendOutcome::Failed { flagged } = outcome else {
        panic!("expected failure");
    };

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].id, flagged);
    assert_eq!(snapshot.id_of_message_got_error, Some(flagged.clone()));
    assert!(!snapshot.is_typing_bot);

    let views = controller.message_views();
    assert!(views[0].failed);

    let events = drain(&mut rx);
    assert!(events.iter().any(|event| matches!(
        event,
        SessionEvent::Toast { level: ToastLevel::Error, .. }
    )));
}

#[tokio::test]
async fn test_stream_dropped_midway_fails() {
    let backend = Arc::new(MockBackend::new().with_chat(ChatScript::DropsAfter(vec![
        "data: {\"content\":\"Partial\"}\n\n".to_string(),
    ])));
    let (controller, _rx) = session(&backend);

    let outcome = controller
        .send_message(Some("tell me more".to_string()), SendOrigin::Input)
        .await;

    assert!(matches!(outcome, SendOutcome::Failed { .. }));
    // Partial text is discarded
    assert_eq!(controller.snapshot().messages.len(), 1);
}

#[tokio::test]
async fn test_resend_uses_newest_content_not_draft() {
    let backend = Arc::new(
        MockBackend::new()
            .with_chat(ChatScript::Unavailable)
            .with_chat(ChatScript::reply(&["Around 1.6 g/kg."])),
    );
    let (controller, _rx) = session(&backend);

    let first = controller
        .send_message(Some("how much protein?".to_string()), SendOrigin::Input)
        .await;
    assert!(matches!(first, SendOutcome::Failed { .. }));

    controller.set_draft("something unrelated");
    let retry = controller
        .send_message(Some("ignored text".to_string()), SendOrigin::Resend)
        .await;

    assert!(matches!(retry, SendOutcome::Delivered { user: None, .. }));
    assert_eq!(
        backend.chat_messages(),
        vec!["how much protein?", "how much protein?"]
    );

    let snapshot = controller.snapshot();
    // No second user echo
    assert_eq!(snapshot.messages.len(), 2);
    assert_eq!(snapshot.messages[0].content, "Around 1.6 g/kg.");
    assert_eq!(snapshot.id_of_message_got_error, None);
    assert_eq!(snapshot.draft, "something unrelated");
}

#[tokio::test]
async fn test_failed_resend_keeps_flag_on_same_message() {
    let backend = Arc::new(
        MockBackend::new()
            .with_chat(ChatScript::Unavailable)
            .with_chat(ChatScript::Unavailable),
    );
    let (controller, mut rx) = session(&backend);

    let SendOutcome::Failed { flagged } = controller
        .send_message(Some("best pre-run snack?".to_string()), SendOrigin::Input)
        .await
    else {
        panic!("expected failure");
    };
    drain(&mut rx);

    let retry = controller.send_message(None, SendOrigin::Resend).await;

    assert_eq!(retry, SendOutcome::Failed { flagged: flagged.clone() });
    assert_eq!(
        backend.chat_messages(),
        vec!["best pre-run snack?", "best pre-run snack?"]
    );

    let snapshot = controller.snapshot();
    // Resend never echoes the user message again
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].id, flagged);
    assert_eq!(snapshot.id_of_message_got_error, Some(flagged));
    assert!(!snapshot.is_typing_bot);
    assert!(!snapshot.is_loading);
    assert!(controller.message_views()[0].failed);

    let events = drain(&mut rx);
    assert!(!events
        .iter()
        .any(|event| matches!(event, SessionEvent::MessageAdded { .. })));
    assert!(events.iter().any(|event| matches!(
        event,
        SessionEvent::Toast { level: ToastLevel::Error, .. }
    )));
}

#[tokio::test]
async fn test_resend_on_empty_session_is_ignored() {
    let backend = Arc::new(MockBackend::new());
    let (controller, _rx) = session(&backend);

    let outcome = controller.send_message(None, SendOrigin::Resend).await;

    assert_eq!(outcome, SendOutcome::Ignored);
    assert!(backend.chat_messages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_send_ignored_while_reply_streaming() {
    let backend = Arc::new(
        MockBackend::new()
            .with_delay(Duration::from_secs(1))
            .with_chat(ChatScript::reply(&["First answer"])),
    );
    let (controller, _rx) = session(&backend);

    let sender = controller.clone();
    let first = tokio::spawn(async move {
        sender
            .send_message(Some("first".to_string()), SendOrigin::Input)
            .await
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(controller.snapshot().is_typing_bot);

    let second = controller
        .send_message(Some("second".to_string()), SendOrigin::Input)
        .await;
    assert_eq!(second, SendOutcome::Ignored);

    let first = first.await.unwrap();
    assert!(matches!(first, SendOutcome::Delivered { .. }));
    assert_eq!(backend.chat_messages(), vec!["first"]);
}

#[tokio::test]
async fn test_follow_up_options_on_newest_reply_only() {
    let backend = Arc::new(
        MockBackend::new()
            .with_chat(ChatScript::reply(&["Pick one:\n", "<<Yes>>\n<<No>>"]))
            .with_chat(ChatScript::reply(&["Great.\n<<Start now>>"])),
    );
    let (controller, mut rx) = session(&backend);

    controller
        .send_message(Some("ready?".to_string()), SendOrigin::Input)
        .await;

    let views = controller.message_views();
    assert_eq!(views[0].body, "Pick one:");
    assert_eq!(views[0].options, vec!["Yes", "No"]);
    assert_eq!(
        controller.quick_replies().map(|f| f.options),
        Some(vec!["Yes".to_string(), "No".to_string()])
    );

    controller.set_draft("half typed");
    drain(&mut rx);
    let outcome = controller.select_follow_up("Yes").await;
    assert!(matches!(outcome, SendOutcome::Delivered { .. }));

    assert_eq!(backend.chat_messages()[1], "<<Yes>>");
    assert_eq!(controller.draft(), "half typed");
    assert!(!drain(&mut rx).contains(&SessionEvent::InputCleared));

    let views = controller.message_views();
    assert_eq!(views[0].options, vec!["Start now"]);
    assert_eq!(views[1].body, "<<Yes>>");
    // Older reply renders raw and offers nothing
    assert!(views[2].options.is_empty());
    assert_eq!(views[2].body, "Pick one:\n<<Yes>>\n<<No>>");
}

#[tokio::test]
async fn test_select_greeting_shows_message_sends_prompt() {
    let backend = Arc::new(
        MockBackend::new()
            .with_chat(ChatScript::reply(&["Here is your week."]))
            .with_chat(ChatScript::reply(&["Sure."])),
    );
    let (controller, _rx) = session(&backend);

    let plan = Greeting::new("g-1", "Plan my week", "Create a seven day training plan");
    controller.select_greeting(&plan).await;

    let bare = greeting("g-2", "Motivate me");
    controller.select_greeting(&bare).await;

    assert_eq!(
        backend.chat_messages(),
        vec!["Create a seven day training plan", "Motivate me"]
    );

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.messages[1].content, "Motivate me");
    assert_eq!(snapshot.messages[3].content, "Plan my week");
}

#[tokio::test]
async fn test_history_cursor_advances_until_exhausted() {
    let backend = Arc::new(
        MockBackend::new()
            .with_history_page(vec![
                remote("30", Role::Assistant, "Welcome back"),
                remote("29", Role::User, "hey"),
            ])
            .with_history_page(vec![remote("28", Role::Assistant, "Hi!")])
            .with_history_page(Vec::new()),
    );
    let (controller, mut rx) = session(&backend);

    assert_eq!(controller.get_messages().await, PageOutcome::Loaded(2));
    assert_eq!(controller.get_messages().await, PageOutcome::Loaded(1));
    assert_eq!(controller.get_messages().await, PageOutcome::Exhausted);
    assert_eq!(controller.get_messages().await, PageOutcome::Skipped);
    assert_eq!(controller.on_history_sentinel_visible().await, PageOutcome::Skipped);

    let after_ids: Vec<Option<String>> = backend
        .history_queries()
        .into_iter()
        .map(|query| query.after_id)
        .collect();
    assert_eq!(
        after_ids,
        vec![None, Some("29".to_string()), Some("28".to_string())]
    );

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.cursor, HistoryCursor::ReachedEnd);
    let ids: Vec<&str> = snapshot.messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["30", "29", "28"]);
    assert!(!snapshot.is_loading_messages);

    assert_eq!(
        drain(&mut rx),
        vec![
            SessionEvent::HistoryLoaded { count: 2 },
            SessionEvent::HistoryLoaded { count: 1 },
            SessionEvent::HistoryExhausted,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_history_requests_collapse() {
    let backend = Arc::new(
        MockBackend::new()
            .with_delay(Duration::from_millis(500))
            .with_history_page(vec![remote("10", Role::Assistant, "older")]),
    );
    let (controller, _rx) = session(&backend);

    let (first, second) = tokio::join!(controller.get_messages(), controller.get_messages());

    let mut outcomes = vec![first, second];
    outcomes.sort_by_key(|outcome| matches!(outcome, PageOutcome::Skipped));
    assert_eq!(outcomes, vec![PageOutcome::Loaded(1), PageOutcome::Skipped]);
    assert_eq!(backend.history_queries().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_history_fetch_right_after_reset_runs() {
    let backend = Arc::new(
        MockBackend::new()
            .with_delay(Duration::from_secs(1))
            .with_history_page(vec![remote("10", Role::Assistant, "after reset")]),
    );
    let (controller, _rx) = session(&backend);

    let pager = controller.clone();
    let pending = tokio::spawn(async move { pager.get_messages().await });
    tokio::time::sleep(Duration::from_millis(10)).await;

    // The cancelled request has not been polled again yet when the next one starts
    controller.reset();
    assert_eq!(controller.get_messages().await, PageOutcome::Loaded(1));
    assert_eq!(pending.await.unwrap(), PageOutcome::Cancelled);

    let queries = backend.history_queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[1].after_id, None);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].content, "after reset");
    assert!(!snapshot.is_loading_messages);
}

#[tokio::test]
async fn test_history_failure_blocks_auto_paging_until_retry() {
    let backend = Arc::new(
        MockBackend::new()
            .with_history_failure()
            .with_history_page(vec![remote("5", Role::User, "earlier")]),
    );
    let (controller, mut rx) = session(&backend);

    assert_eq!(controller.get_messages().await, PageOutcome::Failed);
    assert!(controller.snapshot().fetch_error);
    assert_eq!(controller.snapshot().cursor, HistoryCursor::Start);
    assert!(drain(&mut rx).is_empty());

    assert_eq!(controller.on_history_sentinel_visible().await, PageOutcome::Skipped);
    assert_eq!(backend.history_queries().len(), 1);

    assert_eq!(controller.retry_history().await, PageOutcome::Loaded(1));
    let snapshot = controller.snapshot();
    assert!(!snapshot.fetch_error);
    assert_eq!(snapshot.cursor, HistoryCursor::After(MessageId::remote("5")));
    assert_eq!(backend.history_queries()[1].after_id, None);
}

#[tokio::test]
async fn test_reply_prepends_while_history_appends() {
    let backend = Arc::new(
        MockBackend::new()
            .with_history_page(vec![remote("9", Role::Assistant, "from yesterday")])
            .with_chat(ChatScript::reply(&["fresh"])),
    );
    let (controller, _rx) = session(&backend);

    controller.get_messages().await;
    controller
        .send_message(Some("new question".to_string()), SendOrigin::Input)
        .await;

    let contents: Vec<String> = controller
        .snapshot()
        .messages
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(contents, vec!["fresh", "new question", "from yesterday"]);
}

#[tokio::test(start_paused = true)]
async fn test_greeting_input_is_debounced() {
    let backend = Arc::new(
        MockBackend::new().with_greeting_page(vec![greeting("g-1", "Protein ideas")], 1),
    );
    let (controller, _rx) = session(&backend);

    controller.greeting_input("p");
    tokio::time::sleep(Duration::from_millis(100)).await;
    controller.greeting_input("pr");
    tokio::time::sleep(Duration::from_millis(100)).await;
    controller.greeting_input("pro");
    tokio::time::sleep(Duration::from_millis(1000)).await;

    let queries = backend.greeting_queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].query.as_deref(), Some("pro"));
    assert_eq!(queries[0].page, 1);
    assert_eq!(controller.greetings().greetings().len(), 1);
}

#[tokio::test]
async fn test_greeting_failure_raises_toast() {
    let backend = Arc::new(MockBackend::new().with_greeting_failure());
    let (controller, mut rx) = session(&backend);

    let outcome = controller.fetch_greetings(None, false).await;

    assert!(matches!(outcome, GreetingFetch::Failed(_)));
    assert!(matches!(
        drain(&mut rx).as_slice(),
        [SessionEvent::Toast { level: ToastLevel::Error, .. }]
    ));
}

#[tokio::test]
async fn test_reset_during_greeting_fetch_discards_page() {
    for _ in 0..16 {
        let backend = Arc::new(
            MockBackend::new()
                .gated()
                .with_greeting_page(vec![greeting("1", "Before reset")], 1)
                .with_greeting_page(vec![greeting("2", "After reset")], 1),
        );
        let (controller, _rx) = session(&backend);

        let searcher = controller.clone();
        let pending = tokio::spawn(async move { searcher.fetch_greetings(None, false).await });
        while backend.greeting_queries().is_empty() {
            tokio::task::yield_now().await;
        }

        controller.reset();
        backend.release();

        assert_eq!(pending.await.unwrap(), GreetingFetch::Cancelled);
        assert!(controller.greetings().greetings().is_empty());
        assert_eq!(controller.greetings().total(), 0);

        // The new generation searches freely
        backend.release();
        let fresh = controller.fetch_greetings(None, false).await;
        assert!(matches!(fresh, GreetingFetch::Loaded { count: 1 }));
        assert_eq!(controller.greetings().greetings().len(), 1);
    }
}

#[tokio::test]
async fn test_reveal_lifecycle() {
    let backend = Arc::new(
        MockBackend::new()
            .with_history_page(vec![remote("3", Role::Assistant, "old reply")])
            .with_chat(ChatScript::reply(&["new reply"])),
    );
    let (controller, _rx) = session(&backend);

    controller.get_messages().await;
    let SendOutcome::Delivered { reply, .. } = controller
        .send_message(Some("hello".to_string()), SendOrigin::Input)
        .await
    else {
        panic!("expected delivery");
    };

    assert!(!controller.begin_reveal(&MessageId::remote("3")));

    assert!(controller.begin_reveal(&reply));
    assert_eq!(controller.snapshot().messages[0].status, Some(MessageStatus::IsTyping));
    assert!(!controller.begin_reveal(&reply));

    assert!(controller.finish_reveal(&reply));
    assert_eq!(controller.snapshot().messages[0].status, None);
}

#[tokio::test(start_paused = true)]
async fn test_reset_cancels_in_flight_send() {
    let backend = Arc::new(
        MockBackend::new()
            .with_delay(Duration::from_secs(1))
            .with_chat(ChatScript::reply(&["fresh start"])),
    );
    let (controller, _rx) = session(&backend);

    let sender = controller.clone();
    let pending = tokio::spawn(async move {
        sender
            .send_message(Some("first".to_string()), SendOrigin::Input)
            .await
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    controller.reset();
    assert_eq!(pending.await.unwrap(), SendOutcome::Cancelled);

    let snapshot = controller.snapshot();
    assert!(snapshot.messages.is_empty());
    assert!(!snapshot.is_typing_bot);
    assert!(!controller.is_shut_down());

    let outcome = controller
        .send_message(Some("again".to_string()), SendOrigin::Input)
        .await;
    assert!(matches!(outcome, SendOutcome::Delivered { .. }));
}

#[tokio::test]
async fn test_shutdown_makes_session_inert() {
    let backend = Arc::new(
        MockBackend::new().with_history_page(vec![remote("1", Role::User, "hello")]),
    );
    let (controller, _rx) = session(&backend);

    controller.shutdown();

    assert!(controller.is_shut_down());
    assert_eq!(controller.get_messages().await, PageOutcome::Cancelled);
    assert_eq!(
        controller
            .send_message(Some("anyone?".to_string()), SendOrigin::Input)
            .await,
        SendOutcome::Cancelled
    );
    assert_eq!(controller.fetch_greetings(None, false).await, GreetingFetch::Cancelled);
    assert!(backend.history_queries().is_empty());
}
