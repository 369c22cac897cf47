use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::ws;
use crate::state::AppState;
use std::sync::Arc;

/// Create the WebSocket router
///
/// `/ws/asr` is unauthenticated; deployments that need access control put it
/// behind a proxy.
pub fn create_ws_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws/asr", get(ws::ws_asr_handler))
        .layer(TraceLayer::new_for_http())
}
