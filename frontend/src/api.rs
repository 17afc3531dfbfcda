use std::time::Duration;

use gloo_net::http::Request;
use gloo_timers::future::TimeoutFuture;
use js_sys::{Array, Uint8Array};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, File, FormData};

use cdac_chatbot::clients::{endpoint_url, with_deadline};
use cdac_chatbot::protocol::{
    CompletionRequest, COMPLETION_PATH, INGESTION_FIELD, INGESTION_PATH, parse_completion_body,
};
use cdac_chatbot::{ChatConfig, ChatError, CompletionClient, Document, IngestionClient};

/// Settings baked in at build time from the same variables the terminal reads.
fn build_time_var(key: &str) -> Option<String> {
    let value = match key {
        "COMPLETION_API_BASE_URL" => option_env!("COMPLETION_API_BASE_URL"),
        "INGESTION_API_BASE_URL" => option_env!("INGESTION_API_BASE_URL"),
        "REQUEST_TIMEOUT_SECS" => option_env!("REQUEST_TIMEOUT_SECS"),
        _ => None,
    };
    value.map(str::to_string)
}

/// Config for the browser build; an invalid baked-in value falls back to defaults.
pub fn load_config() -> ChatConfig {
    ChatConfig::from_lookup(build_time_var).unwrap_or_else(|e| {
        log::error!("{e}; using default settings");
        ChatConfig::default()
    })
}

/// Timer that resolves once `timeout` has passed.
fn deadline(timeout: Duration) -> TimeoutFuture {
    TimeoutFuture::new(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX))
}

fn js_error(context: &str, value: wasm_bindgen::JsValue) -> ChatError {
    ChatError::network(format!("{context}: {value:?}"))
}

/// `fetch`-based completion client.
#[derive(Clone, Debug)]
pub struct CompletionApi {
    url: String,
    timeout: Duration,
}

impl CompletionApi {
    pub fn from_config(config: &ChatConfig) -> Self {
        Self {
            url: endpoint_url(&config.completion_base_url, COMPLETION_PATH),
            timeout: config.request_timeout,
        }
    }

    async fn post(&self, request: &CompletionRequest) -> Result<String, ChatError> {
        let resp = Request::post(&self.url)
            .json(request)
            .map_err(|e| ChatError::network(format!("Serialize error: {e}")))?
            .send()
            .await
            .map_err(|e| ChatError::network(format!("Network error: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ChatError::network(format!("Read error: {e}")))?;
        if !resp.ok() {
            return Err(ChatError::UnexpectedStatus { status, body });
        }

        parse_completion_body(&body)
    }
}

impl CompletionClient for CompletionApi {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ChatError> {
        with_deadline(self.post(request), deadline(self.timeout), self.timeout).await
    }
}

/// `fetch`-based ingestion client posting a multipart form.
#[derive(Clone, Debug)]
pub struct IngestionApi {
    url: String,
    timeout: Duration,
}

impl IngestionApi {
    pub fn from_config(config: &ChatConfig) -> Self {
        Self {
            url: endpoint_url(&config.ingestion_base_url, INGESTION_PATH),
            timeout: config.request_timeout,
        }
    }

    async fn post(&self, document: &Document) -> Result<(), ChatError> {
        let parts = Array::of1(&Uint8Array::from(document.bytes.as_slice()));
        let options = BlobPropertyBag::new();
        if let Some(mime) = &document.content_type {
            options.set_type(mime);
        }
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(|e| js_error("Blob error", e))?;

        let form = FormData::new().map_err(|e| js_error("FormData error", e))?;
        form.append_with_blob_and_filename(INGESTION_FIELD, &blob, &document.file_name)
            .map_err(|e| js_error("FormData error", e))?;

        let resp = Request::post(&self.url)
            .body(form)
            .map_err(|e| ChatError::network(format!("Request error: {e}")))?
            .send()
            .await
            .map_err(|e| ChatError::network(format!("Network error: {e}")))?;

        if !resp.ok() {
            return Err(ChatError::UnexpectedStatus { status: resp.status(), body: String::new() });
        }
        Ok(())
    }
}

impl IngestionClient for IngestionApi {
    async fn upload(&self, document: &Document) -> Result<(), ChatError> {
        with_deadline(self.post(document), deadline(self.timeout), self.timeout).await
    }
}

/// Reads a picked file into a [`Document`].
pub async fn read_file(file: &File) -> Result<Document, ChatError> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| js_error("File read error", e))?;
    let bytes = Uint8Array::new(&buffer).to_vec();
    Ok(Document::new(file.name(), bytes).with_content_type(file.type_()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_build_variables_are_unset() {
        assert_eq!(build_time_var("CHAT_EXPORT_PATH"), None);
        assert!(load_config().request_timeout > Duration::ZERO);
    }

    #[test]
    fn clients_carry_the_configured_deadline() {
        let config = ChatConfig {
            request_timeout: Duration::from_secs(5),
            ..ChatConfig::default()
        };
        let completion = CompletionApi::from_config(&config);
        assert_eq!(completion.timeout, Duration::from_secs(5));
        assert!(completion.url.ends_with(COMPLETION_PATH));
        assert_eq!(IngestionApi::from_config(&config).timeout, Duration::from_secs(5));
    }
}
