use std::time::Duration;

use tracing::debug;

use super::{endpoint_url, CompletionClient};
use crate::config::ChatConfig;
use crate::errors::ChatError;
use crate::protocol::{parse_completion_body, CompletionRequest, COMPLETION_PATH};

/// reqwest-backed client for `POST /v1/chat/completions`.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    http: reqwest::Client,
    url: String,
}

impl HttpCompletionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, url: endpoint_url(base_url, COMPLETION_PATH) })
    }

    pub fn from_config(config: &ChatConfig) -> Result<Self, ChatError> {
        Self::new(&config.completion_base_url, config.request_timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ChatError> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::network(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ChatError::network(e.to_string()))?;
        if !status.is_success() {
            return Err(ChatError::UnexpectedStatus { status: status.as_u16(), body });
        }

        debug!(turns = request.messages.len(), "completion received");
        parse_completion_body(&body)
    }
}
