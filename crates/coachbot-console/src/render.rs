// Terminal output for the chat session

use coachbot_session::{MessageView, SessionController};
use coachbot_types::{Greeting, MessageId, Role, SessionEvent, ToastLevel};
use std::io::Write;

fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "you",
        Role::Assistant => "coach",
    }
}

pub fn format_view(view: &MessageView) -> String {
    let mut out = format!("[{}] {}: {}", view.created_at, speaker(view.role), view.body);
    if view.failed {
        out.push_str("\n  (not delivered, /resend to try again)");
    }
    for (idx, option) in view.options.iter().enumerate() {
        out.push_str(&format!("\n  {}. {}", idx + 1, option));
    }
    out
}

/// Oldest first, the way a terminal scrolls
pub fn print_transcript(views: &[MessageView]) {
    for view in views.iter().rev() {
        println!("{}", format_view(view));
    }
}

pub fn format_greetings(greetings: &[Greeting], has_more: bool) -> String {
    if greetings.is_empty() {
        return "No conversation starters found.".to_string();
    }

    let mut out = String::from("Conversation starters:");
    for (idx, greeting) in greetings.iter().enumerate() {
        out.push_str(&format!("\n  {}. {}", idx + 1, greeting.message));
    }
    if has_more {
        out.push_str("\n  /next for more");
    }
    out
}

/// Text for events the user should see; the rest only go to the log
pub fn event_line(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::Toast { level: ToastLevel::Error, text } => Some(format!("! {}", text)),
        SessionEvent::Toast { level: ToastLevel::Info, text } => Some(format!("i {}", text)),
        SessionEvent::HistoryExhausted => Some("(start of conversation)".to_string()),
        _ => None,
    }
}

/// Type out a fresh reply, then list its quick-replies
pub async fn reveal_reply(controller: &SessionController, id: &MessageId) {
    let Some(view) = controller
        .message_views()
        .into_iter()
        .find(|view| &view.id == id)
    else {
        return;
    };

    if !controller.begin_reveal(id) {
        println!("{}", format_view(&view));
        return;
    }

    let policy = controller.config().reveal;
    let mut stdout = std::io::stdout();
    print!("[{}] {}: ", view.created_at, speaker(view.role));

    let mut shown = 0;
    for frame in policy.frames(&view.body) {
        print!("{}", &frame[shown..]);
        let _ = stdout.flush();
        shown = frame.len();
        if !policy.tick().is_zero() {
            tokio::time::sleep(policy.tick()).await;
        }
    }
    println!();

    controller.finish_reveal(id);
    for (idx, option) in view.options.iter().enumerate() {
        println!("  {}. {}", idx + 1, option);
    }
}
