//! OpenAI-compatible client implementation

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::base::HttpClientBase;
use crate::config::ProviderConfig;
use crate::error::GatewayError;
use crate::provider::adapter::MessageAdapter;
use crate::provider::factory::resolve_api_key;
use crate::provider::traits::ProviderService;
use crate::types::{
    ChatCompletionChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    EmbeddingData, EmbeddingRequest, EmbeddingResponse, MessageRole, ModelCapability,
    ModelDescriptor, Usage,
};

/// OpenAI-compatible client (works with OpenAI, Mistral, Groq, vLLM, etc.)
#[derive(Clone)]
pub struct OpenAIClient {
    base: HttpClientBase,
    chat_path: String,
}

impl OpenAIClient {
    pub fn from_config(config: &ProviderConfig) -> Self {
        let api_key = resolve_api_key(&config.id, config.api_key.as_deref());
        Self {
            base: HttpClientBase::new(
                config.id.clone(),
                config.endpoint.clone(),
                api_key,
                Duration::from_secs(config.timeout_secs),
            ),
            chat_path: config
                .api_path
                .clone()
                .unwrap_or_else(|| "/v1/chat/completions".to_string()),
        }
    }
}

#[async_trait]
impl ProviderService for OpenAIClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, GatewayError> {
        let url = self.base.build_url(&self.chat_path);

        let payload = OpenAIChatRequest {
            model: request.model.clone(),
            messages: MessageAdapter::to_wire_format(&request.messages),
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: request.max_tokens,
            stream: false,
        };

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            "Sending chat request to OpenAI-compatible provider"
        );

        let response: OpenAIChatResponse = self
            .base
            .post_json(&url, &payload, Some(&request.model))
            .await?;
        debug!("Received chat response from OpenAI-compatible provider");

        let choices = response
            .choices
            .into_iter()
            .map(|choice| {
                let content = choice.message.map(|m| m.content).unwrap_or_default();
                ChatCompletionChoice {
                    index: choice.index.unwrap_or(0),
                    message: ChatMessage::new(MessageRole::Assistant, content),
                    finish_reason: choice.finish_reason,
                }
            })
            .collect::<Vec<_>>();

        if choices.is_empty() {
            return Err(GatewayError::provider(
                &self.base.id,
                "response contained no choices",
            ));
        }

        let usage = response.usage.unwrap_or_default();

        Ok(ChatCompletionResponse {
            id: response
                .id
                .unwrap_or_else(|| format!("{}-{}", self.base.id, Utc::now().timestamp())),
            model: request.model.clone(),
            provider: self.base.id.clone(),
            created: response.created.unwrap_or_else(|| Utc::now().timestamp()),
            choices,
            usage: Usage::new(usage.prompt_tokens, usage.completion_tokens),
        })
    }

    async fn create_embeddings(
        &self,
        request: &EmbeddingRequest,
    ) -> Result<EmbeddingResponse, GatewayError> {
        let url = self.base.build_url("/v1/embeddings");

        let payload = OpenAIEmbeddingRequest {
            model: request.model.clone(),
            input: request.input.texts(),
        };

        let response: OpenAIEmbeddingResponse = self
            .base
            .post_json(&url, &payload, Some(&request.model))
            .await?;

        let usage = response.usage.unwrap_or_default();
        let data = response
            .data
            .into_iter()
            .enumerate()
            .map(|(index, item)| EmbeddingData {
                index: item.index.unwrap_or(index as u32),
                embedding: item.embedding,
            })
            .collect();

        Ok(EmbeddingResponse {
            model: request.model.clone(),
            provider: self.base.id.clone(),
            data,
            usage: Usage::new(usage.prompt_tokens, usage.completion_tokens),
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, GatewayError> {
        let url = self.base.build_url("/v1/models");
        let response: OpenAIModelsResponse = self.base.get_json(&url).await?;

        Ok(response
            .data
            .into_iter()
            .map(|m| ModelDescriptor {
                name: m.id.clone(),
                id: m.id,
                provider: self.base.id.clone(),
                capabilities: vec![ModelCapability::Chat, ModelCapability::Embedding],
            })
            .collect())
    }

    async fn health_check(&self) -> bool {
        let url = self.base.build_url("/v1/models");
        self.base.get_json::<OpenAIModelsResponse>(&url).await.is_ok()
    }
}

#[derive(Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIChatResponse {
    id: Option<String>,
    created: Option<i64>,
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    index: Option<u32>,
    message: Option<OpenAIMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: String,
}

#[derive(Deserialize, Default)]
struct OpenAIUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Serialize)]
struct OpenAIEmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingResponse {
    #[serde(default)]
    data: Vec<OpenAIEmbeddingData>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingData {
    index: Option<u32>,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct OpenAIModelsResponse {
    #[serde(default)]
    data: Vec<OpenAIModel>,
}

#[derive(Deserialize)]
struct OpenAIModel {
    id: String,
}
