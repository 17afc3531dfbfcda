//! Seams to the two remote services.
//!
//! The traits carry no `Send` bound: the browser implementations hold
//! `!Send` JS futures, and every caller drives them from a single task.

#[cfg(feature = "native")]
pub mod completion;
#[cfg(feature = "native")]
pub mod ingestion;
pub mod mock;

#[cfg(feature = "native")]
pub use completion::HttpCompletionClient;
#[cfg(feature = "native")]
pub use ingestion::HttpIngestionClient;

use std::future::Future;
use std::time::Duration;

use futures_util::future::{select, Either};

use crate::errors::ChatError;
use crate::models::Document;
use crate::protocol::CompletionRequest;

/// Sends a transcript to the chat-completion service and returns the reply text.
#[allow(async_fn_in_trait)]
pub trait CompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ChatError>;
}

/// Uploads a document to the ingestion service.
#[allow(async_fn_in_trait)]
pub trait IngestionClient {
    async fn upload(&self, document: &Document) -> Result<(), ChatError>;
}

impl<T: CompletionClient> CompletionClient for &T {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ChatError> {
        (**self).complete(request).await
    }
}

impl<T: IngestionClient> IngestionClient for &T {
    async fn upload(&self, document: &Document) -> Result<(), ChatError> {
        (**self).upload(document).await
    }
}

/// Joins a configured base URL and an endpoint path.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Races `request` against `deadline`; a deadline that fires first is a
/// network error. Lets runtimes without a client-level timeout (the browser)
/// bound a request with their own timer future.
pub async fn with_deadline<T>(
    request: impl Future<Output = Result<T, ChatError>>,
    deadline: impl Future<Output = ()>,
    timeout: Duration,
) -> Result<T, ChatError> {
    match select(Box::pin(request), Box::pin(deadline)).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => Err(ChatError::network(format!(
            "no reply within {}s",
            timeout.as_secs_f32()
        ))),
    }
}
