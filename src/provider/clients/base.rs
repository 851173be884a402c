//! Base HTTP client with shared logic

use crate::error::GatewayError;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Base HTTP client shared by all provider clients.
///
/// Owns the reqwest client, the configured per-request timeout, and the
/// mapping from transport failures to the gateway error taxonomy.
#[derive(Clone)]
pub struct HttpClientBase {
    pub id: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    http: Client,
}

impl HttpClientBase {
    pub fn new(id: String, endpoint: String, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            id,
            endpoint,
            api_key,
            timeout,
            http: Client::new(),
        }
    }

    /// Build URL from endpoint and path
    pub fn build_url(&self, path: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Post JSON and decode the JSON response. Applies bearer auth when an
    /// API key is configured. `model` is the model the request targets, used
    /// to report provider-side 404s as model-not-found.
    pub async fn post_json<Req, Res>(
        &self,
        url: &str,
        body: &Req,
        model: Option<&str>,
    ) -> Result<Res, GatewayError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let mut request = self
            .http
            .post(url)
            .timeout(self.timeout)
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(key) = self.api_key.as_deref() {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_error(e, model))?
            .error_for_status()
            .map_err(|e| self.map_error(e, model))?;

        response.json().await.map_err(|e| self.map_error(e, model))
    }

    /// Get JSON and decode the response. Applies bearer auth when configured.
    pub async fn get_json<Res>(&self, url: &str) -> Result<Res, GatewayError>
    where
        Res: DeserializeOwned,
    {
        let mut request = self.http.get(url).timeout(self.timeout);
        if let Some(key) = self.api_key.as_deref() {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_error(e, None))?
            .error_for_status()
            .map_err(|e| self.map_error(e, None))?;

        response.json().await.map_err(|e| self.map_error(e, None))
    }

    fn map_error(&self, err: reqwest::Error, model: Option<&str>) -> GatewayError {
        if err.is_timeout() {
            return GatewayError::timeout(&self.id, self.timeout.as_secs());
        }
        if let Some(status) = err.status() {
            if status == reqwest::StatusCode::NOT_FOUND {
                if let Some(model) = model {
                    return GatewayError::model_not_found(model);
                }
            }
            return GatewayError::provider(&self.id, format!("upstream returned {status}"));
        }
        if err.is_connect() {
            return GatewayError::unavailable(format!("provider '{}' is unreachable: {err}", self.id));
        }
        GatewayError::provider(&self.id, err.to_string())
    }
}
