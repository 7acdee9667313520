//! Application state wiring the relay together.
//!
//! AppState pins the generic `ChatHub` to the WebSocket transport and the
//! provider selected from configuration.

use std::sync::Arc;

use groupstream_core::hub::ChatHub;
use groupstream_infra::llm::build_provider;
use groupstream_types::config::Settings;

use crate::transport::WsGroupTransport;

/// Shared application state handed to every WebSocket handler.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<ChatHub<Arc<WsGroupTransport>>>,
    pub transport: Arc<WsGroupTransport>,
}

impl AppState {
    /// Wire transport, provider, and hub from loaded settings.
    pub fn init(settings: &Settings) -> anyhow::Result<Self> {
        let provider = build_provider(settings)?;
        let transport = Arc::new(WsGroupTransport::new());
        let hub = Arc::new(ChatHub::new(
            provider,
            transport.clone(),
            settings.max_completion_tokens,
        ));

        Ok(Self { hub, transport })
    }
}
