use std::time::Duration;

use crate::errors::ChatError;

pub const DEFAULT_COMPLETION_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_INGESTION_BASE_URL: &str = "http://localhost:8001";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

const COMPLETION_URL_VAR: &str = "COMPLETION_API_BASE_URL";
const INGESTION_URL_VAR: &str = "INGESTION_API_BASE_URL";
const TIMEOUT_VAR: &str = "REQUEST_TIMEOUT_SECS";
const EXPORT_PATH_VAR: &str = "CHAT_EXPORT_PATH";

/// Where the two services live and how long to wait for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub completion_base_url: String,
    pub ingestion_base_url: String,
    pub request_timeout: Duration,
    pub export_path: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            completion_base_url: DEFAULT_COMPLETION_BASE_URL.to_string(),
            ingestion_base_url: DEFAULT_INGESTION_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            export_path: crate::export::EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl ChatConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ChatError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ChatError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(url) = get(COMPLETION_URL_VAR) {
            config.completion_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = get(INGESTION_URL_VAR) {
            config.ingestion_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = get(TIMEOUT_VAR) {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ChatError::InvalidConfig { key: TIMEOUT_VAR.to_string(), value: raw })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(path) = get(EXPORT_PATH_VAR) {
            config.export_path = path;
        }

        Ok(config)
    }
}
