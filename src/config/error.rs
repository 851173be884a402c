use std::io;
use std::net::AddrParseError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required field 'default_provider' in configuration")]
    MissingDefaultProvider,

    #[error("no providers configured - at least one [[providers]] entry is required")]
    NoProvidersConfigured,

    #[error("provider '{provider}' referenced by '{field}' not found in configured providers")]
    ProviderNotFound { provider: String, field: String },

    #[error("provider '{provider}' is missing required field 'endpoint'")]
    MissingEndpoint { provider: String },

    #[error("invalid bind address '{value}': {source}")]
    InvalidBindAddress {
        value: String,
        #[source]
        source: AddrParseError,
    },
}
