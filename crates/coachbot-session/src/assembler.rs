use coachbot_client::{EventStream, Result, StreamEvent};
use futures::StreamExt;

/// Accumulates streamed deltas into the final assistant text.
///
/// Only the complete text is ever handed out: if the stream errors, the
/// partial accumulation is dropped with the assembler.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    accumulated: String,
    deltas: usize,
    done_seen: bool,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Delta { content } => {
                self.accumulated.push_str(&content);
                self.deltas += 1;
            }
            StreamEvent::Done => self.done_seen = true,
        }
    }

    /// Text so far
    pub fn text(&self) -> &str {
        &self.accumulated
    }

    pub fn delta_count(&self) -> usize {
        self.deltas
    }

    pub fn done_seen(&self) -> bool {
        self.done_seen
    }

    pub fn finish(self) -> String {
        self.accumulated
    }

    /// Drain a reply stream to completion
    pub async fn collect(mut stream: EventStream) -> Result<String> {
        let mut assembler = Self::new();

        while let Some(event) = stream.next().await {
            assembler.push(event?);
        }

        if !assembler.done_seen {
            tracing::debug!(deltas = assembler.deltas, "Reply stream ended without [DONE]");
        }

        Ok(assembler.finish())
    }
}
