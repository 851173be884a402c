pub mod chat;
pub mod embeddings;
pub mod models;

use super::dto::HealthResponse;
use super::state::GatewayState;
use crate::error::GatewayError;
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use std::sync::Arc;

/// Authenticate the request and derive the rate-limit client identity.
///
/// With auth enabled the API key doubles as the client identity; otherwise the
/// first `X-Forwarded-For` entry is used, falling back to `"unknown"`.
pub(super) fn authorize(
    state: &GatewayState,
    headers: &HeaderMap,
) -> Result<String, GatewayError> {
    if state.config.auth.enabled {
        let key = headers
            .get(&state.config.auth.header)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| GatewayError::authentication("missing API key"))?;
        if !state.config.auth.api_keys.iter().any(|known| known == key) {
            return Err(GatewayError::authentication("invalid API key"));
        }
        return Ok(key.to_string());
    }

    let client = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    Ok(client)
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Gateway process is up", body = HealthResponse)
    )
)]
pub async fn health_handler(State(_state): State<Arc<GatewayState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
