//! Quick-reply options embedded in assistant text.
//!
//! The backend appends lines such as `<<Show me a meal plan>>` to a reply.
//! Everything from the first such line onward is UI metadata: it is cut from
//! the chat bubble and turned into selectable options.

use once_cell::sync::Lazy;
use regex::Regex;

/// `<<label>>`, non-greedy so several options can share a line
static OPTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<<(.*?)>>").expect("Invalid regex pattern for follow-up options"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowUp {
    /// Prose shown in the chat bubble
    pub body: String,
    /// Option labels in order of appearance
    pub options: Vec<String>,
}

impl FollowUp {
    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }
}

pub fn is_option_line(line: &str) -> bool {
    OPTION_PATTERN.is_match(line)
}

/// Split assistant text into displayed body and option labels
pub fn extract_follow_ups(text: &str) -> FollowUp {
    let lines: Vec<&str> = text.lines().collect();

    // Walk up from the bottom; the earliest option line wins
    let first_option_line = (0..lines.len())
        .rev()
        .filter(|&idx| is_option_line(lines[idx]))
        .last();

    let Some(start) = first_option_line else {
        return FollowUp {
            body: text.to_string(),
            options: Vec::new(),
        };
    };

    let options = lines[start..]
        .iter()
        .filter(|line| is_option_line(line))
        .flat_map(|line| OPTION_PATTERN.captures_iter(line))
        .filter_map(|caps| caps.get(1))
        .map(|label| label.as_str().to_string())
        .filter(|label| !label.trim().is_empty())
        .collect();

    FollowUp {
        body: lines[..start].join("\n").trim_end().to_string(),
        options,
    }
}

/// Wire form of a selected option: the label wrapped back in delimiters
pub fn option_payload(label: &str) -> String {
    format!("<<{}>>", label)
}
