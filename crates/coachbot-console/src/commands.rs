/// One line of user input, interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Free text for the coach
    Say(String),
    /// Pick the numbered quick-reply of the newest answer (1-based)
    Option(usize),
    /// Load older messages
    More,
    /// Retry a failed history load
    RetryHistory,
    /// Resend the newest message
    Resend,
    /// Search greetings; empty query lists all of them
    Greet(String),
    /// Next page of greeting results
    NextGreetings,
    /// Send the numbered greeting (1-based)
    Pick(usize),
    /// Print the whole conversation
    History,
    Reset,
    Help,
    Quit,
    Empty,
}

impl Command {
    /// `quick_replies` is how many options the newest answer offers. A bare
    /// number only picks one when it is in `1..=quick_replies`; anything else
    /// is sent as text.
    pub fn parse(line: &str, quick_replies: usize) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }

        if let Ok(index) = line.parse::<usize>() {
            if (1..=quick_replies).contains(&index) {
                return Command::Option(index);
            }
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Command::Say(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name {
            "more" => Command::More,
            "retry" => Command::RetryHistory,
            "resend" => Command::Resend,
            "greet" => Command::Greet(arg.to_string()),
            "next" => Command::NextGreetings,
            "pick" => match arg.parse::<usize>() {
                Ok(index) if index > 0 => Command::Pick(index),
                _ => Command::Help,
            },
            "history" => Command::History,
            "reset" => Command::Reset,
            "quit" | "exit" => Command::Quit,
            "help" => Command::Help,
            // Unknown commands go to the coach as typed
            _ => Command::Say(line.to_string()),
        }
    }
}

pub const HELP: &str = "\
Type a message and press enter to chat.
  <n>            pick quick-reply n when the latest answer offers one
  /more          load older messages
  /retry         retry a failed history load
  /resend        send the latest message again
  /greet [text]  search conversation starters
  /next          more conversation starters
  /pick <n>      send conversation starter n
  /history       print the conversation
  /reset         start over
  /quit          leave";
