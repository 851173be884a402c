//! Domain types shared by the route layer and the provider clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "system" => Some(MessageRole::System),
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Capabilities a provider declares for its models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ModelCapability {
    Chat,
    Embedding,
    Completion,
}

/// A model as reported by a provider's listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub capabilities: Vec<ModelCapability>,
}

/// Token accounting reported by providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// The two dispatch operations the gateway supports. Used for cache key
/// namespacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Chat,
    Embedding,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Chat => "chat",
            OperationKind::Embedding => "embedding",
        }
    }
}

/// Chat completion request envelope.
///
/// Carries a generated request identifier and timestamp for correlation;
/// neither participates in cache key derivation.
#[derive(Debug, Clone)]
pub struct ChatCompletionRequest {
    pub request_id: String,
    pub created: DateTime<Utc>,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            created: Utc::now(),
            model: model.into(),
            messages,
            temperature: None,
            top_p: None,
            max_tokens: None,
            stream: false,
        }
    }

    /// Normalized payload for cache key derivation. Excludes the request id
    /// and timestamp so semantically identical requests collide.
    pub fn cache_payload(&self) -> Value {
        json!({
            "model": self.model,
            "messages": self.messages,
            "temperature": self.temperature,
            "top_p": self.top_p,
            "max_tokens": self.max_tokens,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletionChoice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub model: String,
    pub provider: String,
    pub created: i64,
    pub choices: Vec<ChatCompletionChoice>,
    pub usage: Usage,
}

/// Embedding input: a single text or a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum EmbeddingInput {
    Single(String),
    Batch(Vec<String>),
}

impl EmbeddingInput {
    pub fn texts(&self) -> Vec<String> {
        match self {
            EmbeddingInput::Single(text) => vec![text.clone()],
            EmbeddingInput::Batch(texts) => texts.clone(),
        }
    }
}

/// Embedding request envelope.
#[derive(Debug, Clone)]
pub struct EmbeddingRequest {
    pub request_id: String,
    pub created: DateTime<Utc>,
    pub model: String,
    pub input: EmbeddingInput,
}

impl EmbeddingRequest {
    pub fn new(model: impl Into<String>, input: EmbeddingInput) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            created: Utc::now(),
            model: model.into(),
            input,
        }
    }

    /// Normalized payload for cache key derivation.
    pub fn cache_payload(&self) -> Value {
        json!({
            "model": self.model,
            "input": self.input.texts(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmbeddingData {
    pub index: u32,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmbeddingResponse {
    pub model: String,
    pub provider: String,
    pub data: Vec<EmbeddingData>,
    pub usage: Usage,
}
