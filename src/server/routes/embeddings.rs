use super::super::REQUEST_ID_HEADER;
use super::super::dto::{EmbeddingPayload, ErrorResponse};
use super::super::error::error_response;
use super::super::state::GatewayState;
use crate::cache::ResponseCache;
use crate::error::GatewayError;
use crate::types::{EmbeddingRequest, EmbeddingResponse, OperationKind};
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use std::sync::Arc;
use tracing::{debug, info, warn};

type EmbeddingResult =
    Result<([(HeaderName, String); 1], Json<EmbeddingResponse>), (StatusCode, Json<ErrorResponse>)>;

#[utoipa::path(
    post,
    path = "/v1/embeddings",
    tag = "embeddings",
    request_body = EmbeddingPayload,
    responses(
        (status = 200, description = "Embeddings produced", body = EmbeddingResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 404, description = "Model not known to any provider", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
        (status = 502, description = "Provider returned an error", body = ErrorResponse),
        (status = 503, description = "No provider could be reached", body = ErrorResponse),
        (status = 504, description = "Provider timed out", body = ErrorResponse)
    )
)]
pub async fn embeddings_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Json(payload): Json<EmbeddingPayload>,
) -> EmbeddingResult {
    let client_id = super::authorize(&state, &headers).map_err(|e| error_response(&e))?;

    if state.config.rate_limit.enabled && state.rate_limiter.is_rate_limited(&client_id) {
        return Err(error_response(&GatewayError::rate_limited(&client_id)));
    }

    if payload.input.texts().is_empty() {
        return Err(error_response(&GatewayError::invalid_request(
            "input cannot be empty",
        )));
    }

    let request = EmbeddingRequest::new(payload.model.clone(), payload.input);

    info!(
        request_id = request.request_id.as_str(),
        model = request.model.as_str(),
        provider = payload.provider.as_deref(),
        "Received embedding request"
    );

    let cacheable = state.config.cache.enabled;
    let cache_key =
        ResponseCache::key(OperationKind::Embedding, &request.model, &request.cache_payload());

    if cacheable {
        if let Some(cached) = state.cache.get(&cache_key).await {
            match serde_json::from_str::<EmbeddingResponse>(&cached) {
                Ok(response) => {
                    debug!(
                        request_id = request.request_id.as_str(),
                        "Cache hit for embeddings"
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
        .create_embeddings(&request)
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
        "Embedding request completed"
    );
    Ok((
        [(HeaderName::from_static(REQUEST_ID_HEADER), request.request_id)],
        Json(response),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, CacheStoreError};
    use crate::config::GatewayConfig;
    use crate::provider::{ProviderService, ServiceFactory};
    use crate::rate_limit::FixedWindowRateLimiter;
    use crate::types::{
        ChatCompletionRequest, ChatCompletionResponse, EmbeddingInput, ModelDescriptor,
    };
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::net::SocketAddr;
    use std::time::Duration;

    struct RecordingStore {
        writes: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CacheStore for RecordingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheStoreError> {
            Ok(None)
        }

        async fn set(
            &self,
            key: &str,
            _value: String,
            _ttl: Duration,
        ) -> Result<(), CacheStoreError> {
            self.writes.lock().push(key.to_string());
            Ok(())
        }
    }

    /// Healthy provider whose embedding dispatch always fails.
    struct FailingProvider;

    #[async_trait]
    impl ProviderService for FailingProvider {
        fn id(&self) -> &str {
            "stub"
        }

        async fn create_chat_completion(
            &self,
            _request: &ChatCompletionRequest,
        ) -> Result<ChatCompletionResponse, GatewayError> {
            Err(GatewayError::provider("stub", "not exercised"))
        }

        async fn create_embeddings(
            &self,
            _request: &EmbeddingRequest,
        ) -> Result<EmbeddingResponse, GatewayError> {
            Err(GatewayError::provider("stub", "backend error"))
        }

        async fn list_models(&self) -> Result<Vec<ModelDescriptor>, GatewayError> {
            Ok(Vec::new())
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn failed_dispatch_never_populates_the_cache() {
        let store = Arc::new(RecordingStore {
            writes: Mutex::new(Vec::new()),
        });
        let config = GatewayConfig {
            bind: "127.0.0.1:8000".parse::<SocketAddr>().expect("addr"),
            default_provider: "stub".to_string(),
            fallback_providers: Vec::new(),
            providers: Vec::new(),
            cache: Default::default(),
            rate_limit: Default::default(),
            auth: Default::default(),
            cors_origins: Vec::new(),
        };
        let factory = ServiceFactory::new("stub", Vec::new());
        factory.register_service_class(
            "stub",
            Arc::new(|| Ok(Arc::new(FailingProvider) as Arc<dyn ProviderService>)),
        );
        let state = Arc::new(GatewayState {
            config,
            factory,
            cache: ResponseCache::new(Arc::clone(&store) as Arc<dyn CacheStore>, Duration::from_secs(300)),
            rate_limiter: FixedWindowRateLimiter::new(100, Duration::from_secs(60)),
        });

        let payload = EmbeddingPayload {
            model: "llama2".to_string(),
            input: EmbeddingInput::Single("hello".to_string()),
            provider: None,
        };
        let result = embeddings_handler(State(state), HeaderMap::new(), Json(payload)).await;

        let (status, Json(body)) = result.err().expect("dispatch fails");
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error.code, "provider_error");
        assert!(store.writes.lock().is_empty());
    }
}
