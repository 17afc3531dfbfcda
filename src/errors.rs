use thiserror::Error;

/// Top-level client error.
/// All variants carry a human-readable message for display/logging, and the
/// whole enum is `Clone` so a failure can sit in a UI signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    // ── Transport errors ─────────────────────────────────────────────────────
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    // ── Protocol errors ──────────────────────────────────────────────────────
    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    // ── Conversation errors ──────────────────────────────────────────────────
    #[error("A completion request is already in flight")]
    RequestInFlight,

    // ── Export errors ────────────────────────────────────────────────────────
    #[error("Spreadsheet export failed: {0}")]
    Export(String),

    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("Invalid value for {key}: '{value}'")]
    InvalidConfig { key: String, value: String },
}

impl ChatError {
    pub fn network(message: impl Into<String>) -> Self {
        ChatError::Network(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        ChatError::MalformedResponse(message.into())
    }

    /// Transport-level failures, including non-2xx answers.
    pub fn is_network(&self) -> bool {
        matches!(self, ChatError::Network(_) | ChatError::UnexpectedStatus { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ChatError::MalformedResponse(_))
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, ChatError::RequestInFlight)
    }
}
