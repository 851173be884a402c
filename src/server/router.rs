use super::docs::ApiDoc;
use super::error::ServerError;
use super::routes;
use super::state::GatewayState;
use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub(super) async fn serve(state: Arc<GatewayState>, addr: SocketAddr) -> Result<(), ServerError> {
    let api = ApiDoc::openapi();
    info!(%addr, "Binding gateway server");

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", api))
        .route("/v1/chat/completions", post(routes::chat::chat_handler))
        .route("/v1/embeddings", post(routes::embeddings::embeddings_handler))
        .route("/v1/models", get(routes::models::models_handler))
        .route("/health", get(routes::health_handler))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "Gateway ready to accept connections");

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(ServerError::Serve)
}

/// Build the CORS layer from the configured origin list; an empty list allows
/// any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let values: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(origin, %error, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(values)
}
