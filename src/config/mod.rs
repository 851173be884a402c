pub mod app;
pub mod error;
pub mod loader;
pub mod provider;

/// Default config file path - can be overridden via CLI argument
pub const CONFIG_PATH: &str = "config/gateway.toml";

pub use app::{AuthSettings, CacheSettings, GatewayConfig, RateLimitSettings};
pub use error::ConfigError;
pub use provider::ProviderConfig;
