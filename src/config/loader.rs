use super::CONFIG_PATH;
use super::app::{AuthSettings, CacheSettings, GatewayConfig, RateLimitSettings};
use super::error::ConfigError;
use super::provider::{ProviderConfig, RawProviderConfig};
use dotenvy::from_filename;
use serde::Deserialize;
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Once;
use tracing::debug;

static ENV_LOADER: Once = Once::new();

const DEFAULT_BIND: &str = "0.0.0.0:8000";

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
pub(super) struct RawConfig {
    pub bind: Option<String>,
    pub default_provider: Option<String>,
    #[serde(default)]
    pub fallback_providers: Vec<String>,
    #[serde(default)]
    pub providers: Vec<RawProviderConfig>,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename("config/.env");
    });
}

/// Load and validate configuration from a file path
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    ensure_env_loaded();
    let config_path = path.unwrap_or_else(|| Path::new(CONFIG_PATH));
    read_config(config_path)
}

fn read_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    debug!(path = %path.display(), "Reading gateway configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_and_build(parsed)
}

fn validate_and_build(parsed: RawConfig) -> Result<GatewayConfig, ConfigError> {
    let default_provider = parsed
        .default_provider
        .ok_or(ConfigError::MissingDefaultProvider)?
        .to_lowercase();

    if parsed.providers.is_empty() {
        return Err(ConfigError::NoProvidersConfigured);
    }

    let mut providers: Vec<ProviderConfig> = Vec::new();
    for raw_provider in parsed.providers {
        if raw_provider.endpoint.is_none() {
            return Err(ConfigError::MissingEndpoint {
                provider: raw_provider.id.clone(),
            });
        }
        providers.push(ProviderConfig::from(raw_provider));
    }

    if !providers.iter().any(|p| p.id == default_provider) {
        return Err(ConfigError::ProviderNotFound {
            provider: default_provider,
            field: "default_provider".to_string(),
        });
    }

    let fallback_providers: Vec<String> = parsed
        .fallback_providers
        .iter()
        .map(|id| id.to_lowercase())
        .collect();
    for id in &fallback_providers {
        if !providers.iter().any(|p| &p.id == id) {
            return Err(ConfigError::ProviderNotFound {
                provider: id.clone(),
                field: "fallback_providers".to_string(),
            });
        }
    }

    let bind_value = parsed.bind.unwrap_or_else(|| DEFAULT_BIND.to_string());
    let bind: SocketAddr = bind_value
        .parse()
        .map_err(|source| ConfigError::InvalidBindAddress {
            value: bind_value,
            source,
        })?;

    Ok(GatewayConfig {
        bind,
        default_provider,
        fallback_providers,
        providers,
        cache: parsed.cache,
        rate_limit: parsed.rate_limit,
        auth: parsed.auth,
        cors_origins: parsed.cors_origins,
    })
}
