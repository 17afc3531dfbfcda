//! Conversation core of the CDAC chatbot client.
//!
//! Target-neutral: the browser front end (`frontend/`) and the terminal
//! binary both drive [`service::conversation::Conversation`]. The reqwest
//! clients and env loading are behind the default `native` feature.

pub mod clients;
pub mod config;
pub mod errors;
pub mod export;
pub mod models;
pub mod protocol;
pub mod service;

pub use clients::{CompletionClient, IngestionClient};
pub use config::ChatConfig;
pub use errors::ChatError;
pub use models::{AlertNotice, Document, IngestionOutcome, Message, Sender, Transcript};
pub use service::conversation::{
    Conversation, ConversationController, PendingCompletion, RequestTicket, SendOutcome, Submission,
};
