//! Transport port: group fan-out delivery operations.
//!
//! The real-time transport (connection lifecycle, framing, delivery) is
//! an external collaborator. The engine only needs these four operations;
//! how they are carried (WebSocket, test recorder) is up to the
//! implementation in the application layer.

use std::sync::Arc;

use groupstream_types::chat::{ConnectionId, ServerEvent};
use groupstream_types::error::TransportError;

/// Group-scoped delivery operations consumed by the broadcast engine.
///
/// Sends are best-effort: a delivery failure to some members must not
/// prevent delivery to the rest, and the engine never retries.
pub trait GroupTransport: Send + Sync {
    /// Register a connection as a member of a group for fan-out purposes,
    /// removing it from any group it was in before.
    fn add_to_group(
        &self,
        connection: ConnectionId,
        group: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Tear down all transport state for a connection (on disconnect).
    fn remove_connection(
        &self,
        connection: ConnectionId,
    ) -> impl Future<Output = ()> + Send;

    /// Deliver an event to every member of a group.
    fn send_to_group(
        &self,
        group: &str,
        event: &ServerEvent,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Deliver an event to every member of a group except the sender.
    fn send_to_others(
        &self,
        group: &str,
        sender: ConnectionId,
        event: &ServerEvent,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

impl<T: GroupTransport> GroupTransport for Arc<T> {
    fn add_to_group(
        &self,
        connection: ConnectionId,
        group: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        (**self).add_to_group(connection, group)
    }

    fn remove_connection(&self, connection: ConnectionId) -> impl Future<Output = ()> + Send {
        (**self).remove_connection(connection)
    }

    fn send_to_group(
        &self,
        group: &str,
        event: &ServerEvent,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        (**self).send_to_group(group, event)
    }

    fn send_to_others(
        &self,
        group: &str,
        sender: ConnectionId,
        event: &ServerEvent,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        (**self).send_to_others(group, sender, event)
    }
}
