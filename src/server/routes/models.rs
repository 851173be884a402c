use super::super::dto::{ErrorResponse, ModelListResponse};
use super::super::error::error_response;
use super::super::state::GatewayState;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use std::sync::Arc;
use tracing::warn;

#[utoipa::path(
    get,
    path = "/v1/models",
    tag = "models",
    responses(
        (status = 200, description = "Models advertised by the reachable providers", body = ModelListResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse)
    )
)]
pub async fn models_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
) -> Result<Json<ModelListResponse>, (StatusCode, Json<ErrorResponse>)> {
    super::authorize(&state, &headers).map_err(|e| error_response(&e))?;

    let mut data = Vec::new();
    for service in state.factory.services() {
        match service.list_models().await {
            Ok(models) => data.extend(models),
            Err(error) => {
                warn!(provider = service.id(), %error, "Skipping provider in model listing");
            }
        }
    }

    Ok(Json(ModelListResponse {
        object: "list".to_string(),
        data,
    }))
}
