use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a freshly streamed reply is revealed on screen.
///
/// Only messages with status `IsNew` are revealed; history and older replies
/// are always shown in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RevealPolicy {
    /// Whole text at once
    Instant,
    /// A few characters per tick
    Typewriter {
        chars_per_tick: usize,
        #[serde(with = "millis")]
        tick: Duration,
    },
}

impl Default for RevealPolicy {
    fn default() -> Self {
        RevealPolicy::Typewriter {
            chars_per_tick: 2,
            tick: Duration::from_millis(15),
        }
    }
}

impl RevealPolicy {
    /// Delay between frames
    pub fn tick(&self) -> Duration {
        match self {
            RevealPolicy::Instant => Duration::ZERO,
            RevealPolicy::Typewriter { tick, .. } => *tick,
        }
    }

    /// Successive prefixes of `text`, ending with the full text
    pub fn frames<'a>(&self, text: &'a str) -> RevealFrames<'a> {
        let step = match self {
            RevealPolicy::Instant => usize::MAX,
            RevealPolicy::Typewriter { chars_per_tick, .. } => (*chars_per_tick).max(1),
        };
        RevealFrames {
            text,
            step,
            shown: 0,
            finished: false,
        }
    }
}

/// Iterator of growing prefixes, always cut on char boundaries
#[derive(Debug, Clone)]
pub struct RevealFrames<'a> {
    text: &'a str,
    step: usize,
    shown: usize,
    finished: bool,
}

impl<'a> Iterator for RevealFrames<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let end = self.text[self.shown..]
            .char_indices()
            .nth(self.step)
            .map(|(offset, _)| self.shown + offset)
            .unwrap_or(self.text.len());

        self.shown = end;
        if end == self.text.len() {
            self.finished = true;
        }
        Some(&self.text[..end])
    }
}

pub(crate) mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
