//! Ollama client implementation

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::base::HttpClientBase;
use crate::config::ProviderConfig;
use crate::error::GatewayError;
use crate::provider::adapter::MessageAdapter;
use crate::provider::traits::ProviderService;
use crate::types::{
    ChatCompletionChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    EmbeddingData, EmbeddingRequest, EmbeddingResponse, MessageRole, ModelCapability,
    ModelDescriptor, Usage,
};

/// Models reported when the Ollama tag listing comes back empty.
const DEFAULT_MODELS: [&str; 6] = ["llama2", "mistral", "codellama", "phi", "gemma", "llama3.2:1b"];

/// Ollama client for local LLMs
#[derive(Clone)]
pub struct OllamaClient {
    base: HttpClientBase,
}

impl OllamaClient {
    /// Creates client from provider config. Ollama needs no API key.
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            base: HttpClientBase::new(
                config.id.clone(),
                config.endpoint.clone(),
                None,
                Duration::from_secs(config.timeout_secs),
            ),
        }
    }

    fn descriptor(&self, name: &str) -> ModelDescriptor {
        ModelDescriptor {
            id: name.to_string(),
            name: name.to_string(),
            provider: self.base.id.clone(),
            capabilities: vec![ModelCapability::Chat, ModelCapability::Embedding],
        }
    }
}

#[async_trait]
impl ProviderService for OllamaClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, GatewayError> {
        let url = self.base.build_url("/api/chat");

        let payload = OllamaChatRequest {
            model: request.model.clone(),
            messages: MessageAdapter::to_wire_format(&request.messages),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                top_p: request.top_p,
                num_predict: request.max_tokens,
            },
        };

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            "Sending chat request to Ollama"
        );

        let response: OllamaChatResponse = self
            .base
            .post_json(&url, &payload, Some(&request.model))
            .await?;
        debug!("Received chat response from Ollama");

        let content = response
            .message
            .ok_or_else(|| GatewayError::provider(&self.base.id, "response is missing message"))?
            .content;

        let prompt_tokens = response.prompt_eval_count.unwrap_or(0);
        let completion_tokens = response.eval_count.unwrap_or(0);

        Ok(ChatCompletionResponse {
            id: format!("{}-{}", self.base.id, Utc::now().timestamp()),
            model: request.model.clone(),
            provider: self.base.id.clone(),
            created: Utc::now().timestamp(),
            choices: vec![ChatCompletionChoice {
                index: 0,
                message: ChatMessage::new(MessageRole::Assistant, content),
                finish_reason: Some("stop".to_string()),
            }],
            usage: Usage::new(prompt_tokens, completion_tokens),
        })
    }

    async fn create_embeddings(
        &self,
        request: &EmbeddingRequest,
    ) -> Result<EmbeddingResponse, GatewayError> {
        let url = self.base.build_url("/api/embeddings");

        let mut data = Vec::new();
        let mut total_tokens = 0u32;

        // Ollama embeds one prompt per call.
        for (index, text) in request.input.texts().into_iter().enumerate() {
            let payload = OllamaEmbeddingRequest {
                model: request.model.clone(),
                prompt: text,
            };
            let response: OllamaEmbeddingResponse = self
                .base
                .post_json(&url, &payload, Some(&request.model))
                .await?;
            total_tokens += response.token_count.unwrap_or(0);
            data.push(EmbeddingData {
                index: index as u32,
                embedding: response.embedding,
            });
        }

        Ok(EmbeddingResponse {
            model: request.model.clone(),
            provider: self.base.id.clone(),
            data,
            usage: Usage::new(total_tokens, 0),
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, GatewayError> {
        let url = self.base.build_url("/api/tags");
        let response: OllamaTagsResponse = self.base.get_json(&url).await?;

        let mut models: Vec<ModelDescriptor> = response
            .models
            .iter()
            .map(|m| self.descriptor(&m.name))
            .collect();

        if models.is_empty() {
            warn!(
                provider = self.base.id.as_str(),
                "Ollama reported no models, using default list"
            );
            models = DEFAULT_MODELS.iter().map(|name| self.descriptor(name)).collect();
        }

        Ok(models)
    }

    async fn health_check(&self) -> bool {
        let url = self.base.build_url("/api/tags");
        self.base.get_json::<OllamaTagsResponse>(&url).await.is_ok()
    }
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<serde_json::Value>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

#[derive(Serialize)]
struct OllamaEmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
    token_count: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaTag>,
}

#[derive(Deserialize)]
struct OllamaTag {
    name: String,
}
