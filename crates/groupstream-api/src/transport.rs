//! WebSocket-backed implementation of the [`GroupTransport`] port.
//!
//! Each connected socket registers an unbounded mpsc sender here; the
//! socket's own task drains the matching receiver and writes frames out.
//! Fan-out is best-effort: a member whose receiver has gone away is
//! skipped and logged, never retried, and never blocks delivery to the
//! rest of the group.
//!
//! All three tables are dashmaps, so contention is scoped to one group
//! entry or one connection entry, never the whole process.

use std::collections::HashSet;

use dashmap::DashMap;
use tokio::sync::mpsc;

use groupstream_core::transport::GroupTransport;
use groupstream_types::chat::{ConnectionId, ServerEvent};
use groupstream_types::error::TransportError;

/// Per-connection outbound channels plus transport-side group rosters.
#[derive(Debug, Default)]
pub struct WsGroupTransport {
    senders: DashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,
    groups: DashMap<String, HashSet<ConnectionId>>,
    membership: DashMap<ConnectionId, String>,
}

impl WsGroupTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly attached connection's outbound channel.
    pub fn register(&self, connection: ConnectionId, sender: mpsc::UnboundedSender<ServerEvent>) {
        self.senders.insert(connection, sender);
    }

    /// Deliver an event to exactly one connection (used for request-local
    /// errors and pongs, which never fan out).
    pub fn send_to_connection(&self, connection: ConnectionId, event: &ServerEvent) {
        if let Some(sender) = self.senders.get(&connection) {
            if sender.send(event.clone()).is_err() {
                tracing::debug!(%connection, "dropping event for closed connection");
            }
        }
    }

    fn fan_out(&self, group: &str, exclude: Option<ConnectionId>, event: &ServerEvent) {
        // Snapshot the roster so no group lock is held across sends.
        let members: Vec<ConnectionId> = match self.groups.get(group) {
            Some(entry) => entry.iter().copied().collect(),
            None => return,
        };

        for member in members {
            if exclude == Some(member) {
                continue;
            }
            if let Some(sender) = self.senders.get(&member) {
                if sender.send(event.clone()).is_err() {
                    tracing::debug!(connection = %member, %group, "skipping closed member");
                }
            }
        }
    }
}

impl GroupTransport for WsGroupTransport {
    async fn add_to_group(
        &self,
        connection: ConnectionId,
        group: &str,
    ) -> Result<(), TransportError> {
        if let Some(previous) = self.membership.insert(connection, group.to_string()) {
            if previous != group {
                if let Some(mut roster) = self.groups.get_mut(&previous) {
                    roster.remove(&connection);
                }
            }
        }
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(connection);
        Ok(())
    }

    async fn remove_connection(&self, connection: ConnectionId) {
        self.senders.remove(&connection);
        if let Some((_, group)) = self.membership.remove(&connection) {
            if let Some(mut roster) = self.groups.get_mut(&group) {
                roster.remove(&connection);
            }
        }
    }

    async fn send_to_group(&self, group: &str, event: &ServerEvent) -> Result<(), TransportError> {
        self.fan_out(group, None, event);
        Ok(())
    }

    async fn send_to_others(
        &self,
        group: &str,
        sender: ConnectionId,
        event: &ServerEvent,
    ) -> Result<(), TransportError> {
        self.fan_out(group, Some(sender), event);
        Ok(())
    }
}
