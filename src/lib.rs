//! Unified LLM gateway.
//!
//! Routes chat completion and embedding requests to interchangeable backend
//! providers, selecting a provider by model identifier with a deterministic
//! fallback chain, and wrapping dispatch with response caching and
//! fixed-window rate limiting.

pub mod cache;
pub mod config;
pub mod error;
pub mod provider;
pub mod rate_limit;
pub mod server;
pub mod types;

pub use error::GatewayError;
