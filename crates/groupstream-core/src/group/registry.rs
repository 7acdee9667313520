//! Connection-to-group membership registry.
//!
//! Pure in-memory state with no external calls. Absence is represented as
//! `None`, never as an error. Contention is scoped to a single connection's
//! entry (dashmap shard lock), so lookups for unrelated connections never
//! block on each other.

use dashmap::DashMap;

use groupstream_types::chat::ConnectionId;

/// Maps each live connection to at most one group.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    members: DashMap<ConnectionId, String>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self {
            members: DashMap::new(),
        }
    }

    /// Associate a connection with a group, replacing any prior
    /// association. Idempotent for the same group.
    pub fn join(&self, connection: ConnectionId, group: impl Into<String>) {
        self.members.insert(connection, group.into());
    }

    /// Remove any association for a connection. No-op if none exists.
    pub fn leave(&self, connection: ConnectionId) {
        self.members.remove(&connection);
    }

    /// Look up the group a connection belongs to.
    pub fn resolve(&self, connection: ConnectionId) -> Option<String> {
        self.members.get(&connection).map(|entry| entry.clone())
    }
}
