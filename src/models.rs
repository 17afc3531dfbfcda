use std::time::Duration;

use serde::{Deserialize, Serialize};

/// First entry of every transcript.
pub const WELCOME_MESSAGE: &str = "Welcome to CDAC-ChatBot application.";

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Document uploaded successfully!";
pub const UPLOAD_FAILURE_MESSAGE: &str = "Error uploading document.";

/// How long an [`AlertNotice`] stays on screen.
pub const ALERT_AUTO_HIDE: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Sender {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "user" => Ok(Sender::User),
            "bot" => Ok(Sender::Bot),
            other => Err(format!("Unknown sender: {other}")),
        }
    }
}

/// A single chat line. Fields are private so a message cannot change once it
/// is part of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    sender: Sender,
    text: String,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self { sender, text: text.into() }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// One spreadsheet row, borrowed from the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportRow<'a> {
    pub sender: &'a str,
    pub text: &'a str,
}

/// Append-only conversation history. Entries are never reordered or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// A fresh transcript holding only the welcome message.
    pub fn new() -> Self {
        Self { messages: vec![Message::bot(WELCOME_MESSAGE)] }
    }

    /// A transcript with exactly these messages; skips the welcome message.
    #[cfg(test)]
    pub(crate) fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn to_export_rows(&self) -> Vec<ExportRow<'_>> {
        self.messages
            .iter()
            .map(|m| ExportRow { sender: m.sender.as_str(), text: &m.text })
            .collect()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

/// A user-chosen file headed for the ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), content_type: None, bytes }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        self.content_type = (!content_type.is_empty()).then_some(content_type);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionOutcome {
    Success,
    Failure,
}

impl IngestionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, IngestionOutcome::Success)
    }
}

impl<E> From<&Result<(), E>> for IngestionOutcome {
    fn from(result: &Result<(), E>) -> Self {
        match result {
            Ok(()) => IngestionOutcome::Success,
            Err(_) => IngestionOutcome::Failure,
        }
    }
}

/// Transient notice shown after an upload; never part of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlertNotice {
    pub message: String,
    pub visible: bool,
}

impl AlertNotice {
    pub fn for_outcome(outcome: IngestionOutcome) -> Self {
        let message = match outcome {
            IngestionOutcome::Success => UPLOAD_SUCCESS_MESSAGE,
            IngestionOutcome::Failure => UPLOAD_FAILURE_MESSAGE,
        };
        Self { message: message.to_string(), visible: true }
    }

    pub fn dismiss(&mut self) {
        self.visible = false;
    }
}
