pub mod alert;
pub mod chat;
pub mod header;
