//! In-memory client doubles.
//!
//! Replies are scripted up front and every request is recorded for test
//! assertions. Interior mutability via `Mutex` so the doubles work behind `&self`.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::{CompletionClient, IngestionClient};
use crate::errors::ChatError;
use crate::models::Document;
use crate::protocol::CompletionRequest;

/// Completion double that answers from a queue of scripted results.
#[derive(Debug, Default)]
pub struct ScriptedCompletionClient {
    replies: Mutex<VecDeque<Result<String, ChatError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one successful reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    /// Queues one failure.
    pub fn fail(self, error: ChatError) -> Self {
        self.push(Err(error));
        self
    }

    pub fn push(&self, result: Result<String, ChatError>) {
        self.replies
            .lock()
            .expect("replies lock poisoned")
            .push_back(result);
    }

    /// All requests received so far, oldest first.
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ChatError> {
        tracing::debug!(turns = request.messages.len(), "Mock completion: recording request");
        self.requests
            .lock()
            .map_err(|e| ChatError::network(format!("requests lock poisoned: {e}")))?
            .push(request.clone());
        self.replies
            .lock()
            .map_err(|e| ChatError::network(format!("replies lock poisoned: {e}")))?
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::network("no scripted reply left")))
    }
}

/// Ingestion double that records uploads and returns a fixed result.
#[derive(Debug)]
pub struct RecordingIngestionClient {
    result: Result<(), ChatError>,
    uploads: Mutex<Vec<Document>>,
}

impl RecordingIngestionClient {
    pub fn accepting() -> Self {
        Self { result: Ok(()), uploads: Mutex::new(Vec::new()) }
    }

    pub fn failing(error: ChatError) -> Self {
        Self { result: Err(error), uploads: Mutex::new(Vec::new()) }
    }

    pub fn recorded_uploads(&self) -> Vec<Document> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

impl Default for RecordingIngestionClient {
    fn default() -> Self {
        Self::accepting()
    }
}

impl IngestionClient for RecordingIngestionClient {
    async fn upload(&self, document: &Document) -> Result<(), ChatError> {
        tracing::debug!(file_name = %document.file_name, "Mock ingestion: recording upload");
        self.uploads
            .lock()
            .map_err(|e| ChatError::network(format!("uploads lock poisoned: {e}")))?
            .push(document.clone());
        self.result.clone()
    }
}
