use thiserror::Error;

use crate::llm::LlmError;

/// Errors from handling one inbound chat event.
///
/// All variants are local to the triggering request; none affect other
/// connections or groups.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The sending connection has not joined any group.
    #[error("not in a group")]
    NotInGroup,

    /// The completion provider's stream failed mid-reply. No assistant
    /// message is appended for the failed session.
    #[error("completion stream failed: {0}")]
    Provider(#[from] LlmError),
}

/// Delivery failure in the transport layer.
///
/// Fan-out is best-effort: the engine logs these and keeps going.
#[derive(Debug, Error)]
#[error("transport send failed: {0}")]
pub struct TransportError(pub String);
