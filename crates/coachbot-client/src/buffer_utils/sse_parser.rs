use futures::{Stream, StreamExt};

use super::buffering::CircularLineBuffer;
use crate::error::ClientError;
use crate::streaming::{EventStream, StreamEvent};

/// Strategy pattern for parsing the payload of SSE `data:` lines
pub trait SseLineParser: Send {
    /// Parse a data payload into a stream event.
    /// `Ok(None)` means the frame carries nothing worth emitting.
    fn parse_data_line(&self, data: &str) -> Result<Option<StreamEvent>, serde_json::Error>;

    /// Check if this payload is the end-of-stream marker
    fn is_done_marker(&self, data: &str) -> bool {
        data == "[DONE]"
    }
}

/// Generic SSE stream parser over any chunked byte source.
///
/// The `[DONE]` marker is reported but does not stop reading; the stream ends
/// when the source does. Malformed frames are logged and skipped. Transport
/// errors are yielded to the consumer. A trailing partial line left when the
/// source ends is dropped.
pub fn parse_sse_stream<S, B, E, P>(chunks: S, parser: P) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
    P: SseLineParser + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(chunks);
        let mut buffer = CircularLineBuffer::with_capacity(4096);

        while let Some(chunk_result) = byte_chunks.next().await {
            let bytes = match chunk_result {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(ClientError::Stream(Box::new(e)));
                    return;
                }
            };

            buffer.extend(bytes.as_ref());

            // Process all complete lines in buffer
            while let Some(line) = buffer.next_line() {
                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };
                let data = data.trim();

                if parser.is_done_marker(data) {
                    yield Ok(StreamEvent::Done);
                    continue;
                }

                match parser.parse_data_line(data) {
                    Ok(Some(event)) => yield Ok(event),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, frame = %data, "Skipping malformed stream frame");
                    }
                }
            }
        }

        if !buffer.is_empty() {
            tracing::debug!(bytes = buffer.len(), "Discarding unterminated trailing line");
        }
    })
}
