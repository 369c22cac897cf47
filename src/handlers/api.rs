use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::core::stt::STTProvider;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Root handler
/// Returns a simple JSON response indicating the server is running
pub async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(json!({
        "status": "OK"
    })))
}

/// Health handler reporting the default provider
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let provider = state.core_state.stt_factory.default_provider();
    Json(json!({
        "status": "ok",
        "provider": provider.to_string()
    }))
}

/// Provider description returned by the discovery endpoints
#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub display_name: &'static str,
    pub default: bool,
    /// Whether the credentials this provider needs are present
    pub configured: bool,
}

fn describe(state: &AppState, provider: STTProvider) -> ProviderInfo {
    let configured = match provider {
        STTProvider::Volcengine => state.config.has_volcengine_credentials(),
        STTProvider::Alibaba => state.config.has_alibaba_credentials(),
    };
    ProviderInfo {
        name: provider.to_string(),
        display_name: provider.display_name(),
        default: provider == state.core_state.stt_factory.default_provider(),
        configured,
    }
}

/// List every supported provider
pub async fn list_providers(State(state): State<Arc<AppState>>) -> Json<Vec<ProviderInfo>> {
    Json(
        STTProvider::ALL
            .into_iter()
            .map(|provider| describe(&state, provider))
            .collect(),
    )
}

/// Describe one provider by name
pub async fn get_provider(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<ProviderInfo>> {
    let provider: STTProvider = name
        .parse()
        .map_err(|_| AppError::NotFound(format!("Unknown provider: {name}")))?;
    Ok(Json(describe(&state, provider)))
}
