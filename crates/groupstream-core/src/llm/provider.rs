//! LlmProvider trait definition.
//!
//! This is the capability interface the broadcast engine streams against.
//! `stream` returns a `Pin<Box<dyn Stream>>` so the trait stays
//! object-safe: the concrete backend (OpenAI or Azure OpenAI) is chosen
//! once at startup and carried as a [`SharedProvider`], never selected
//! per request.

use std::pin::Pin;
use std::sync::Arc;

use futures_util::Stream;

use groupstream_types::llm::{CompletionRequest, LlmError, StreamEvent};

/// A provider selected at startup, shared across all handler tasks.
pub type SharedProvider = Arc<dyn LlmProvider>;

/// Trait for completion provider backends.
///
/// The returned stream is lazy, finite, and non-restartable: the engine
/// is its sole consumer and drives it to exhaustion (or drops it on
/// error). Implementations live in `groupstream-infra`.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai", "azure_openai").
    fn name(&self) -> &str;

    /// Model or deployment identifier requests are sent to.
    fn model(&self) -> &str;

    /// Send a streaming completion request. Returns a stream of events
    /// ending in [`StreamEvent::Done`] on success.
    fn stream(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;
}
