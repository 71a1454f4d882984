//! TravelChat - conversational hotel booking assistant client library
//!
//! This library provides the chat session persistence layer and the
//! conversation flow for the TravelChat client, including local session
//! storage, the remote assistant and speech clients, and configuration.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `storage`: Session records, the key-value backends, and `SessionStore`
//! - `backend`: Assistant, hotel and speech HTTP clients
//! - `controller`: Conversation flow over a store and a backend
//! - `playback`: Text-to-speech playback state
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use travelchat::backend::HttpAssistantBackend;
//! use travelchat::storage::SledStore;
//! use travelchat::{Config, ConversationController, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> travelchat::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let store = SessionStore::new(Arc::new(SledStore::open_default()?));
//!     let backend = Arc::new(HttpAssistantBackend::new(&config.backend)?);
//!     let mut controller = ConversationController::new(store, backend);
//!     controller.send_message("hotels in Paris next weekend").await;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod playback;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use controller::ConversationController;
pub use error::{Result, TravelChatError};
pub use storage::{ChatMessage, ChatSession, SessionStore};

#[cfg(test)]
pub mod test_utils;
