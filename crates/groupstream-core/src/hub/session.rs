//! Ephemeral per-reply accumulation state.

use uuid::Uuid;

/// Broadcast only once the unflushed tail exceeds this many characters.
pub(crate) const FLUSH_THRESHOLD: usize = 20;

/// Accumulator for one in-flight streamed reply.
///
/// Owned by exactly one handler task, so the buffer only ever grows and
/// `last_flushed` is monotonically non-decreasing and never exceeds the
/// buffer length.
#[derive(Debug)]
pub struct StreamingSession {
    /// Correlation id clients use to merge updates into one bubble.
    pub id: Uuid,
    buffer: String,
    last_flushed: usize,
}

impl StreamingSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            buffer: String::new(),
            last_flushed: 0,
        }
    }

    /// Append a content delta to the buffer.
    pub fn push(&mut self, delta: &str) {
        self.buffer.push_str(delta);
    }

    /// Whether enough unflushed content has accumulated to broadcast.
    ///
    /// The threshold counts characters, not bytes; `last_flushed` is
    /// always a char boundary because it only ever lands on the full
    /// buffer length.
    pub fn should_flush(&self) -> bool {
        self.buffer[self.last_flushed..].chars().count() > FLUSH_THRESHOLD
    }

    /// Record that the entire buffer has been broadcast.
    pub fn mark_flushed(&mut self) {
        self.last_flushed = self.buffer.len();
    }

    /// The full accumulated content so far.
    pub fn content(&self) -> &str {
        &self.buffer
    }
}

impl Default for StreamingSession {
    fn default() -> Self {
        Self::new()
    }
}
