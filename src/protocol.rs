//! Wire schemas for the chat-completion endpoint.
//!
//! Request: `{ "messages": [{ "role", "content" }, ...], "max_tokens": 50 }`.
//! Response: only `choices[0].message.content` is consumed; everything else
//! the server sends is ignored.

use serde::{Deserialize, Serialize};

use crate::errors::ChatError;
use crate::models::{Message, Sender, Transcript};

/// Reply length cap sent with every completion request.
pub const MAX_REPLY_TOKENS: u32 = 50;

pub const COMPLETION_PATH: &str = "/v1/chat/completions";
pub const INGESTION_PATH: &str = "/api/run_ingest";

/// Multipart field carrying the uploaded document.
pub const INGESTION_FIELD: &str = "document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl From<Sender> for Role {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::User => Role::User,
            Sender::Bot => Role::Assistant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for ChatTurn {
    fn from(m: &Message) -> Self {
        Self { role: m.sender().into(), content: m.text().to_string() }
    }
}

/// Request body for `POST /v1/chat/completions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatTurn>,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// The whole transcript, welcome message included, in order.
    pub fn from_transcript(transcript: &Transcript) -> Self {
        Self {
            messages: transcript.messages().iter().map(ChatTurn::from).collect(),
            max_tokens: MAX_REPLY_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionResponse {
    pub fn into_reply(self) -> Result<String, ChatError> {
        let first = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::malformed("response has no choices"))?;
        first
            .message
            .content
            .ok_or_else(|| ChatError::malformed("first choice has no message content"))
    }
}

/// Extracts the reply text from a raw completion response body.
///
/// A body that is not JSON at all is a transport problem ([`ChatError::Network`]);
/// JSON without the expected fields is [`ChatError::MalformedResponse`].
pub fn parse_completion_body(body: &str) -> Result<String, ChatError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ChatError::network(format!("Response body is not JSON: {e}")))?;
    let response: CompletionResponse =
        serde_json::from_value(value).map_err(|e| ChatError::malformed(e.to_string()))?;
    response.into_reply()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_maps_bot_to_assistant_and_caps_tokens() {
        let mut transcript = Transcript::new();
        transcript.append(Message::user("hi"));

        let body = serde_json::to_value(CompletionRequest::from_transcript(&transcript)).unwrap();
        assert_eq!(
            body,
            json!({
                "messages": [
                    { "role": "assistant", "content": crate::models::WELCOME_MESSAGE },
                    { "role": "user", "content": "hi" }
                ],
                "max_tokens": 50
            })
        );
    }

    #[test]
    fn parse_first_choice_content() {
        let body = json!({
            "id": "cmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "Hi" }, "finish_reason": "stop" },
                { "index": 1, "message": { "role": "assistant", "content": "ignored" } }
            ],
            "usage": { "prompt_tokens": 3 }
        })
        .to_string();
        assert_eq!(parse_completion_body(&body), Ok("Hi".to_string()));
    }

    #[test]
    fn empty_choices_is_malformed() {
        let err = parse_completion_body(r#"{"choices":[]}"#).unwrap_err();
        assert!(err.is_malformed(), "{err}");
    }

    #[test]
    fn missing_fields_are_malformed() {
        for body in [
            r#"{}"#,
            r#"{"choices":[{}]}"#,
            r#"{"choices":[{"message":{}}]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{"choices":"nope"}"#,
        ] {
            let err = parse_completion_body(body).unwrap_err();
            assert!(err.is_malformed(), "{body}: {err}");
        }
    }

    #[test]
    fn non_json_body_is_network_error() {
        let err = parse_completion_body("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, ChatError::Network(_)), "{err}");
    }
}
