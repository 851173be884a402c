use super::error::ConfigError;
use super::provider::ProviderConfig;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Response caching settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Fixed-window rate limiting settings, shared by all clients.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

/// API key authentication settings for the route layer.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_api_key_header")]
    pub header: String,
    #[serde(default)]
    pub api_keys: Vec<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            header: default_api_key_header(),
            api_keys: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_max_requests() -> u32 {
    100
}

fn default_window_secs() -> u64 {
    60
}

fn default_api_key_header() -> String {
    "x-api-key".to_string()
}

/// Gateway configuration loaded from gateway.toml
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind: SocketAddr,
    pub default_provider: String,
    pub fallback_providers: Vec<String>,
    pub providers: Vec<ProviderConfig>,
    pub cache: CacheSettings,
    pub rate_limit: RateLimitSettings,
    pub auth: AuthSettings,
    pub cors_origins: Vec<String>,
}

impl GatewayConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }
}
