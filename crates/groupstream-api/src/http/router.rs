//! Axum router configuration with middleware.
//!
//! Middleware: CORS, tracing. If a static web directory exists
//! (configurable via `GROUPSTREAM_WEB_DIR`, default `public/`), its
//! files are served for paths that match nothing else, so a bundled
//! chat page can ship next to the binary.

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/ws/chat", get(handlers::ws::ws_handler))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let web_dir = std::env::var("GROUPSTREAM_WEB_DIR").unwrap_or_else(|_| "public".to_string());
    if std::path::Path::new(&web_dir).exists() {
        router = router.fallback_service(ServeDir::new(&web_dir));
        tracing::info!(path = %web_dir, "static file serving enabled");
    }

    router
}

/// GET /health - simple liveness probe.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
