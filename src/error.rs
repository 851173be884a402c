//! Gateway error taxonomy.

use thiserror::Error;

/// Errors surfaced by provider dispatch, resolution, and the route layer.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no provider available for model '{model}'")]
    ModelNotFound { model: String },

    #[error("service unavailable: {reason}")]
    ServiceUnavailable { reason: String },

    #[error("provider '{provider}' returned an error: {reason}")]
    Provider { provider: String, reason: String },

    #[error("request to provider '{provider}' timed out after {timeout_secs}s")]
    Timeout { provider: String, timeout_secs: u64 },

    #[error("rate limit exceeded for client '{client}'")]
    RateLimited { client: String },

    #[error("authentication failed: {reason}")]
    Authentication { reason: String },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },
}

impl GatewayError {
    pub fn model_not_found(model: impl Into<String>) -> Self {
        Self::ModelNotFound {
            model: model.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            reason: reason.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(provider: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            provider: provider.into(),
            timeout_secs,
        }
    }

    pub fn rate_limited(client: impl Into<String>) -> Self {
        Self::RateLimited {
            client: client.into(),
        }
    }

    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Whether the fallback loop may swallow this error and advance to the
    /// next candidate. Anything else aborts resolution immediately.
    pub fn is_candidate_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::ModelNotFound { .. }
                | GatewayError::ServiceUnavailable { .. }
                | GatewayError::Provider { .. }
                | GatewayError::Timeout { .. }
        )
    }

    /// Stable machine-readable code, used in API error bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::ModelNotFound { .. } => "model_not_found",
            GatewayError::ServiceUnavailable { .. } => "service_unavailable",
            GatewayError::Provider { .. } => "provider_error",
            GatewayError::Timeout { .. } => "timeout_error",
            GatewayError::RateLimited { .. } => "rate_limit_exceeded",
            GatewayError::Authentication { .. } => "authentication_error",
            GatewayError::InvalidRequest { .. } => "invalid_request",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_failures_cover_exactly_the_catchable_kinds() {
        assert!(GatewayError::model_not_found("m").is_candidate_failure());
        assert!(GatewayError::unavailable("down").is_candidate_failure());
        assert!(GatewayError::provider("p", "boom").is_candidate_failure());
        assert!(GatewayError::timeout("p", 30).is_candidate_failure());

        assert!(!GatewayError::rate_limited("c").is_candidate_failure());
        assert!(!GatewayError::authentication("bad key").is_candidate_failure());
        assert!(!GatewayError::invalid_request("empty").is_candidate_failure());
    }
}
