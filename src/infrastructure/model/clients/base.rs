//! Base HTTP client with shared logic

use crate::infrastructure::model::types::ModelError;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Base HTTP client with shared functionality
#[derive(Clone)]
pub struct HttpClientBase {
    pub endpoint: String,
    pub timeout: Duration,
    pub http: Client,
}

impl HttpClientBase {
    /// The timeout covers the whole request, connect through body.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ModelError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ModelError::network)?;
        Ok(Self {
            endpoint: endpoint.into(),
            timeout,
            http,
        })
    }

    /// Build URL from endpoint and path
    pub fn build_url(&self, path: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Post JSON without auth (for local services like Ollama)
    pub async fn post_no_auth<Req, Res>(&self, url: &str, body: &Req) -> Result<Res, ModelError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status { status, body });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        serde_json::from_slice(&bytes).map_err(|e| ModelError::invalid_response(e.to_string()))
    }

    fn classify(&self, err: reqwest::Error) -> ModelError {
        if err.is_timeout() {
            ModelError::Timeout {
                timeout: self.timeout,
            }
        } else {
            ModelError::network(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_joins_paths_correctly() {
        let base = HttpClientBase::new("http://localhost:11434/", Duration::from_secs(1))
            .expect("client");
        assert_eq!(base.build_url("/api/chat"), "http://localhost:11434/api/chat");
        assert_eq!(base.build_url("api/chat"), "http://localhost:11434/api/chat");
    }
}
