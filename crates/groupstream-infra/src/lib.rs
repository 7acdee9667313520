//! Infrastructure layer for Groupstream.
//!
//! Contains implementations of the ports defined in `groupstream-core`:
//! the OpenAI and Azure OpenAI completion providers (one generic type,
//! selected once at startup) and the TOML configuration loader.

pub mod config;
pub mod llm;
