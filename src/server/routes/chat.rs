use super::super::REQUEST_ID_HEADER;
use super::super::dto::{ChatCompletionPayload, ErrorResponse};
use super::super::error::error_response;
use super::super::state::GatewayState;
use crate::cache::ResponseCache;
use crate::error::GatewayError;
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, OperationKind};
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use std::sync::Arc;
use tracing::{debug, info, warn};

type ChatResult =
    Result<([(HeaderName, String); 1], Json<ChatCompletionResponse>), (StatusCode, Json<ErrorResponse>)>;

#[utoipa::path(
    post,
    path = "/v1/chat/completions",
    tag = "chat",
    request_body = ChatCompletionPayload,
    responses(
        (status = 200, description = "Chat completion produced", body = ChatCompletionResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 404, description = "Model not known to any provider", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
        (status = 502, description = "Provider returned an error", body = ErrorResponse),
        (status = 503, description = "No provider could be reached", body = ErrorResponse),
        (status = 504, description = "Provider timed out", body = ErrorResponse)
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Json(payload): Json<ChatCompletionPayload>,
) -> ChatResult {
    let client_id = super::authorize(&state, &headers).map_err(|e| error_response(&e))?;

    if state.config.rate_limit.enabled && state.rate_limiter.is_rate_limited(&client_id) {
        return Err(error_response(&GatewayError::rate_limited(&client_id)));
    }

    if payload.messages.is_empty() {
        return Err(error_response(&GatewayError::invalid_request(
            "messages cannot be empty",
        )));
    }

    let mut request = ChatCompletionRequest::new(payload.model.clone(), payload.messages);
    request.temperature = payload.temperature;
    request.top_p = payload.top_p;
    request.max_tokens = payload.max_tokens;
    request.stream = payload.stream;

    info!(
        request_id = request.request_id.as_str(),
        model = request.model.as_str(),
        provider = payload.provider.as_deref(),
        "Received chat completion request"
    );

    // Streamed responses are never cached.
    let cacheable = state.config.cache.enabled && !request.stream;
    let cache_key =
        ResponseCache::key(OperationKind::Chat, &request.model, &request.cache_payload());

    if cacheable {
        if let Some(cached) = state.cache.get(&cache_key).await {
            match serde_json::from_str::<ChatCompletionResponse>(&cached) {
                Ok(response) => {
                    debug!(
                        request_id = request.request_id.as_str(),
                        "Cache hit for chat completion"
                    );
                    return Ok((
                        [(HeaderName::from_static(REQUEST_ID_HEADER), request.request_id)],
                        Json(response),
                    ));
                }
                Err(error) => {
                    warn!(%error, "Discarding undeserializable cache entry");
                }
            }
        }
    }

    let service = state
        .factory
        .get_service_for_model(&request.model, payload.provider.as_deref())
        .await
        .map_err(|e| error_response(&e))?;

    let response = service
        .create_chat_completion(&request)
        .await
        .map_err(|e| error_response(&e))?;

    if cacheable {
        if let Ok(serialized) = serde_json::to_string(&response) {
            state.cache.set(&cache_key, serialized, None).await;
        }
    }

    info!(
        request_id = request.request_id.as_str(),
        provider = response.provider.as_str(),
        "Chat completion request completed"
    );
    Ok((
        [(HeaderName::from_static(REQUEST_ID_HEADER), request.request_id)],
        Json(response),
    ))
}
