//! Shared domain types for Groupstream.
//!
//! This crate contains the types shared across the Groupstream relay:
//! chat messages and wire events, LLM request/stream types, configuration,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, secrecy,
//! and thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
