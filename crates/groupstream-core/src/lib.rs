//! Relay logic and collaborator trait definitions for Groupstream.
//!
//! This crate owns the only non-trivial state in the system: the group
//! membership registry, the per-group conversation history, and the
//! streaming broadcast engine that turns a triggered chat message into a
//! throttled sequence of group-wide updates. The transport layer and the
//! completion provider are "ports" ([`transport::GroupTransport`],
//! [`llm::provider::LlmProvider`]) implemented elsewhere -- this crate
//! depends only on `groupstream-types`, never on axum or an HTTP client.

pub mod group;
pub mod hub;
pub mod llm;
pub mod transport;
