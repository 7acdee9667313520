//! Chat domain types: connections, transcript messages, and outbound wire events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier for one live client connection.
///
/// Minted when a client attaches and never reused. Uses UUID v7 so ids
/// sort by attach time in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Role of a message in a group transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            other => Err(format!("invalid chat role: '{other}'")),
        }
    }
}

/// A single entry in a group's conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub author: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            author: author.into(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            author: author.into(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Outbound event broadcast to WebSocket clients.
///
/// Serialized as serde-tagged JSON text frames. `MessageUpdate` carries the
/// full accumulated reply so far under a stable correlation `id`; clients
/// merge successive updates into one evolving message bubble. There is no
/// "final" flag -- the last update with a given id is the complete reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Plain relay of a user message.
    NewMessage { author: String, text: String },
    /// Incremental or final assistant reply keyed by correlation id.
    MessageUpdate {
        author: String,
        id: Uuid,
        text: String,
    },
    /// Request-local error reported back to the calling connection.
    Error { message: String },
    /// Keep-alive response.
    Pong,
}
