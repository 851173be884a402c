use super::dto::{
    ChatCompletionPayload, EmbeddingPayload, ErrorBody, ErrorResponse, HealthResponse,
    ModelListResponse,
};
use super::routes;
use crate::types::{
    ChatCompletionChoice, ChatCompletionResponse, ChatMessage, EmbeddingData, EmbeddingInput,
    EmbeddingResponse, MessageRole, ModelCapability, ModelDescriptor, Usage,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::chat::chat_handler,
        routes::embeddings::embeddings_handler,
        routes::models::models_handler,
        routes::health_handler
    ),
    components(
        schemas(
            ChatCompletionPayload,
            ChatCompletionResponse,
            ChatCompletionChoice,
            ChatMessage,
            MessageRole,
            EmbeddingPayload,
            EmbeddingInput,
            EmbeddingResponse,
            EmbeddingData,
            ModelListResponse,
            ModelDescriptor,
            ModelCapability,
            Usage,
            HealthResponse,
            ErrorResponse,
            ErrorBody
        )
    ),
    tags(
        (name = "chat", description = "Chat completion dispatch"),
        (name = "embeddings", description = "Embedding dispatch"),
        (name = "models", description = "Aggregated model listing"),
        (name = "health", description = "Liveness probe")
    )
)]
pub(super) struct ApiDoc;
