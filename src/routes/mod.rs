use std::sync::Arc;

use axum::{Router, http::HeaderValue};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::config::ServerConfig;
use crate::state::AppState;

pub mod api;
pub mod ws;

/// Assemble the full application router
pub fn create_app(app_state: Arc<AppState>) -> Router {
    let cors = cors_layer(&app_state.config);

    api::create_api_router()
        .merge(ws::create_ws_router())
        .layer(cors)
        .with_state(app_state)
}

/// CORS policy for the browser client
///
/// Permissive unless `cors_allowed_origins` is configured.
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let Some(origins) = &config.cors_allowed_origins else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
