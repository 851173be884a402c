//! Provider capability contract

use crate::error::GatewayError;
use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, EmbeddingRequest, EmbeddingResponse,
    ModelDescriptor,
};
use async_trait::async_trait;

/// The uniform operation set every provider exposes, regardless of backend.
///
/// The factory treats all implementations interchangeably; failures surface
/// as `Provider`, `Timeout`, or `ModelNotFound` errors, which the fallback
/// loop catches during candidate evaluation.
#[async_trait]
pub trait ProviderService: Send + Sync {
    /// Get the provider ID
    fn id(&self) -> &str;

    /// Create a chat completion
    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, GatewayError>;

    /// Create embeddings for the given input
    async fn create_embeddings(
        &self,
        request: &EmbeddingRequest,
    ) -> Result<EmbeddingResponse, GatewayError>;

    /// List the models this provider reports as available
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, GatewayError>;

    /// Check if the backend is reachable and healthy
    async fn health_check(&self) -> bool;
}
