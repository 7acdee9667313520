//! HTTP layer for groupstream.
//!
//! Axum-based: a `/ws/chat` WebSocket endpoint for the relay protocol,
//! a `/health` probe, and optional static file serving for a bundled
//! chat page.

pub mod handlers;
pub mod router;
