mod commands;
mod config;
mod render;

use coachbot_client::{ChatBackend, HttpBackend};
use coachbot_session::{GreetingFetch, PageOutcome, SendOrigin, SendOutcome, SessionController, SessionIdentity};
use coachbot_types::SessionEvent;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commands::{Command, HELP};
use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // COACHBOT_CONFIG points at a single file and skips the layered lookup
    let config = match std::env::var("COACHBOT_CONFIG") {
        Ok(path) => Config::from_file(path),
        Err(_) => Config::load(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    let user_id = config
        .user_id
        .clone()
        .unwrap_or_else(|| format!("guest-{}", uuid::Uuid::new_v4()));
    tracing::info!("Starting Coachbot console for {}", user_id);
    tracing::info!("Backend: {}", config.backend.base_url);

    let backend: Arc<dyn ChatBackend> = Arc::new(HttpBackend::new(config.backend.clone())?);
    let (controller, events) =
        SessionController::new(backend, SessionIdentity::new(user_id), config.session.clone());

    tokio::spawn(print_events(events));

    println!("Coachbot. Type /help for commands.");
    controller.get_messages().await;
    render::print_transcript(&controller.message_views());

    if let GreetingFetch::Loaded { .. } = controller.fetch_greetings(None, false).await {
        let greetings = controller.greetings();
        println!("{}", render::format_greetings(&greetings.greetings(), greetings.has_more()));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };

        let offered = controller
            .quick_replies()
            .map_or(0, |follow_up| follow_up.options.len());
        if !handle(&controller, Command::parse(&line, offered)).await {
            break;
        }
    }

    controller.shutdown();
    tracing::info!("Session closed");
    Ok(())
}

/// Run one command. Returns false when the user wants to leave.
async fn handle(controller: &SessionController, command: Command) -> bool {
    match command {
        Command::Say(text) => {
            controller.set_draft(text);
            let outcome = controller.send_message(None, SendOrigin::Input).await;
            show_outcome(controller, outcome).await;
        }
        Command::Option(index) => {
            let label = controller
                .quick_replies()
                .and_then(|follow_up| follow_up.options.get(index - 1).cloned());
            match label {
                Some(label) => {
                    let outcome = controller.select_follow_up(&label).await;
                    show_outcome(controller, outcome).await;
                }
                None => println!("No quick-reply {}.", index),
            }
        }
        Command::More => {
            let outcome = controller.on_history_sentinel_visible().await;
            show_history(controller, outcome);
        }
        Command::RetryHistory => {
            let outcome = controller.retry_history().await;
            show_history(controller, outcome);
        }
        Command::Resend => {
            let outcome = controller.send_message(None, SendOrigin::Resend).await;
            show_outcome(controller, outcome).await;
        }
        Command::Greet(query) => {
            let outcome = controller.fetch_greetings(Some(query), false).await;
            show_greetings(controller, outcome);
        }
        Command::NextGreetings => {
            if controller.greetings().has_more() {
                let outcome = controller.fetch_greetings(None, true).await;
                show_greetings(controller, outcome);
            } else {
                println!("No more conversation starters.");
            }
        }
        Command::Pick(index) => match controller.greetings().greetings().get(index - 1) {
            Some(greeting) => {
                let outcome = controller.select_greeting(greeting).await;
                show_outcome(controller, outcome).await;
            }
            None => println!("No conversation starter {}.", index),
        },
        Command::History => render::print_transcript(&controller.message_views()),
        Command::Reset => {
            controller.reset();
            println!("Started a new conversation.");
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => return false,
        Command::Empty => {}
    }
    true
}

async fn show_outcome(controller: &SessionController, outcome: SendOutcome) {
    match outcome {
        SendOutcome::Delivered { reply, .. } => render::reveal_reply(controller, &reply).await,
        SendOutcome::Ignored => println!("(still answering, or nothing to send)"),
        // Failures surface through the toast stream
        SendOutcome::Failed { .. } | SendOutcome::Cancelled => {}
    }
}

fn show_history(controller: &SessionController, outcome: PageOutcome) {
    match outcome {
        PageOutcome::Loaded(_) => render::print_transcript(&controller.message_views()),
        PageOutcome::Failed => println!("Could not load older messages. /retry to try again."),
        PageOutcome::Skipped if controller.snapshot().fetch_error => {
            println!("Loading is paused after an error. /retry to try again.")
        }
        PageOutcome::Skipped | PageOutcome::Exhausted | PageOutcome::Cancelled => {}
    }
}

fn show_greetings(controller: &SessionController, outcome: GreetingFetch) {
    if let GreetingFetch::Loaded { .. } = outcome {
        let greetings = controller.greetings();
        println!("{}", render::format_greetings(&greetings.greetings(), greetings.has_more()));
    }
}

async fn print_events(mut events: UnboundedReceiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        tracing::debug!(?event, "Session event");
        if let Some(line) = render::event_line(&event) {
            println!("{}", line);
        }
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // stderr keeps log lines out of the chat
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
