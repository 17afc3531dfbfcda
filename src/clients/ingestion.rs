use std::time::Duration;

use reqwest::multipart::{Form, Part};
use tracing::debug;

use super::{endpoint_url, IngestionClient};
use crate::config::ChatConfig;
use crate::errors::ChatError;
use crate::models::Document;
use crate::protocol::{INGESTION_FIELD, INGESTION_PATH};

/// reqwest-backed client for `POST /api/run_ingest`.
///
/// The response body is never read; only the status decides the outcome.
#[derive(Debug, Clone)]
pub struct HttpIngestionClient {
    http: reqwest::Client,
    url: String,
}

impl HttpIngestionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, url: endpoint_url(base_url, INGESTION_PATH) })
    }

    pub fn from_config(config: &ChatConfig) -> Result<Self, ChatError> {
        Self::new(&config.ingestion_base_url, config.request_timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn document_part(document: &Document) -> Result<Part, ChatError> {
    let part = Part::bytes(document.bytes.clone()).file_name(document.file_name.clone());
    match &document.content_type {
        Some(mime) => part
            .mime_str(mime)
            .map_err(|e| ChatError::network(format!("Invalid content type '{mime}': {e}"))),
        None => Ok(part),
    }
}

impl IngestionClient for HttpIngestionClient {
    async fn upload(&self, document: &Document) -> Result<(), ChatError> {
        let form = Form::new().part(INGESTION_FIELD, document_part(document)?);

        let response = self
            .http
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChatError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::UnexpectedStatus {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        debug!(file_name = %document.file_name, bytes = document.bytes.len(), "document ingested");
        Ok(())
    }
}
