//! Error types for TravelChat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for TravelChat operations
///
/// This enum covers configuration loading, the remote assistant and speech
/// backends, and the local chat-history storage.
#[derive(Error, Debug)]
pub enum TravelChatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote assistant backend errors (transport failure, non-2xx status, bad payload)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Speech transcription or synthesis errors
    #[error("Speech error: {0}")]
    Speech(String),

    /// The local key-value store cannot be read or written
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A stored record does not parse or does not have the expected shape
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Audio playback errors
    #[error("Playback error: {0}")]
    Playback(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for TravelChat operations
///
/// Uses `anyhow::Error` so callers can attach context while the typed
/// `TravelChatError` variants stay recoverable through `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;
