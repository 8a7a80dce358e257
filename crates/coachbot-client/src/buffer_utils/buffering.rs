use std::collections::VecDeque;

/// Circular buffer for line-based parsing of a chunked body.
///
/// Lines are split on the `\n` byte before decoding, so a multi-byte UTF-8
/// character cut in half by a chunk boundary is decoded whole once the rest
/// of its line arrives.
pub struct CircularLineBuffer {
    buffer: VecDeque<u8>,
}

impl CircularLineBuffer {
    /// Create a new buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Add bytes to the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract next complete line, without its `\n` / `\r\n` terminator.
    /// Returns None while only a partial line is buffered.
    pub fn next_line(&mut self) -> Option<String> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;

        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();

        let line = String::from_utf8_lossy(&line_bytes);
        Some(line.trim_end_matches(['\n', '\r']).to_string())
    }

    /// Current buffer size
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
