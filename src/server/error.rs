use super::dto::{ErrorBody, ErrorResponse};
use crate::error::GatewayError;
use axum::Json;
use axum::http::StatusCode;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind HTTP listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Map the gateway error taxonomy to an HTTP status and error body.
pub(super) fn error_response(error: &GatewayError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match error {
        GatewayError::ModelNotFound { .. } => StatusCode::NOT_FOUND,
        GatewayError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        GatewayError::Provider { .. } => StatusCode::BAD_GATEWAY,
        GatewayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        GatewayError::Authentication { .. } => StatusCode::UNAUTHORIZED,
        GatewayError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
    };
    let body = ErrorResponse {
        error: ErrorBody {
            code: error.error_code().to_string(),
            message: error.to_string(),
        },
    };
    (status, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        let cases = [
            (GatewayError::model_not_found("m"), StatusCode::NOT_FOUND),
            (GatewayError::unavailable("down"), StatusCode::SERVICE_UNAVAILABLE),
            (GatewayError::provider("p", "boom"), StatusCode::BAD_GATEWAY),
            (GatewayError::timeout("p", 30), StatusCode::GATEWAY_TIMEOUT),
            (GatewayError::rate_limited("c"), StatusCode::TOO_MANY_REQUESTS),
            (GatewayError::authentication("bad"), StatusCode::UNAUTHORIZED),
            (GatewayError::invalid_request("empty"), StatusCode::BAD_REQUEST),
        ];
        for (error, expected) in cases {
            let (status, body) = error_response(&error);
            assert_eq!(status, expected);
            assert_eq!(body.error.code, error.error_code());
        }
    }
}
