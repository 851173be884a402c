//! # Provider Configuration
//!
//! Configuration types for backend LLM providers. Supported provider types
//! are `ollama` (local, no API key) and anything OpenAI-compatible.

use crate::types::ModelCapability;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Configuration for a backend provider.
///
/// Each provider represents a connection to an inference service endpoint.
/// The declared `models` list is inverted into the model→provider
/// compatibility index at load time.
///
/// # Example
///
/// ```toml
/// [[providers]]
/// id = "ollama"
/// type = "ollama"
/// endpoint = "http://localhost:11434"
/// timeout_secs = 30
/// models = ["llama3.2:1b", "llama2", "mistral"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ProviderConfig {
    /// Unique identifier for this provider (e.g., "ollama", "openai-proxy")
    pub id: String,
    /// The provider type determines API format: "ollama" or "openai"
    #[serde(rename = "type")]
    pub provider_type: String,
    /// API endpoint URL
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom chat API path override (e.g., "/openai/v1/chat/completions")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_path: Option<String>,
    /// Outbound request timeout in seconds
    pub timeout_secs: u64,
    /// Declared capabilities, in preference order
    pub capabilities: Vec<ModelCapability>,
    /// Models this provider is declared compatible with
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct RawProviderConfig {
    pub(super) id: String,
    #[serde(rename = "type", default)]
    pub(super) provider_type: String,
    pub(super) endpoint: Option<String>,
    pub(super) api_key: Option<String>,
    #[serde(default)]
    pub(super) api_path: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub(super) timeout_secs: u64,
    #[serde(default = "default_capabilities")]
    pub(super) capabilities: Vec<ModelCapability>,
    #[serde(default)]
    pub(super) models: Vec<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_capabilities() -> Vec<ModelCapability> {
    vec![ModelCapability::Chat, ModelCapability::Embedding]
}

impl From<RawProviderConfig> for ProviderConfig {
    fn from(raw: RawProviderConfig) -> Self {
        Self {
            id: raw.id.to_lowercase(),
            provider_type: raw.provider_type,
            endpoint: raw.endpoint.unwrap_or_default(),
            api_key: raw.api_key,
            api_path: raw.api_path,
            timeout_secs: raw.timeout_secs,
            capabilities: raw.capabilities,
            models: raw.models,
        }
    }
}

impl ProviderConfig {
    /// Check if this is an Ollama provider (case-insensitive).
    pub fn is_ollama(&self) -> bool {
        self.provider_type.eq_ignore_ascii_case("ollama")
            || self.provider_type.eq_ignore_ascii_case("localai")
    }
}
