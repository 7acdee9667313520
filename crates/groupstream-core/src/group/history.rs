//! Per-group conversation transcripts.
//!
//! One append-only transcript per group, created implicitly on first
//! append and kept for the process lifetime. There is no eviction: a
//! group that everyone has left still holds its transcript, so memory
//! grows with the number of groups ever seen.
//!
//! The dashmap entry guard serializes appends within one group while
//! leaving appends to different groups fully independent. No lock spans
//! more than one group.

use dashmap::DashMap;

use groupstream_types::chat::ChatMessage;

/// Ordered conversation transcripts keyed by group name.
#[derive(Debug, Default)]
pub struct GroupHistoryStore {
    transcripts: DashMap<String, Vec<ChatMessage>>,
}

impl GroupHistoryStore {
    pub fn new() -> Self {
        Self {
            transcripts: DashMap::new(),
        }
    }

    /// Append a user message and return a snapshot of the full transcript
    /// including it, suitable for direct submission as model context.
    pub fn append_user(
        &self,
        group: &str,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Vec<ChatMessage> {
        let mut entry = self.transcripts.entry(group.to_string()).or_default();
        entry.push(ChatMessage::user(author, content));
        entry.clone()
    }

    /// Append an assistant message to the group's transcript.
    pub fn append_assistant(
        &self,
        group: &str,
        author: impl Into<String>,
        content: impl Into<String>,
    ) {
        self.transcripts
            .entry(group.to_string())
            .or_default()
            .push(ChatMessage::assistant(author, content));
    }

    /// Snapshot of a group's transcript, if the group has any history.
    pub fn transcript(&self, group: &str) -> Option<Vec<ChatMessage>> {
        self.transcripts.get(group).map(|entry| entry.clone())
    }
}
