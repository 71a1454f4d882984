//! Test utilities for TravelChat
//!
//! This module provides common test utilities including temporary directory
//! management, test file creation, sample sessions and assertion helpers.

use crate::error::Result;
use crate::storage::{ChatMessage, ChatSession};
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = format!("{:#}", e);
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// A greeting followed by one user message, ready to be saved
pub fn sample_session(id: &str, user_text: &str) -> ChatSession {
    let mut session = ChatSession::new(id, "New Chat");
    session.push(ChatMessage::greeting());
    session.push(ChatMessage::user(user_text));
    session
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
backend:
  base_url: "http://127.0.0.1:8000"
  timeout_seconds: 5
speech:
  enabled: false
  base_url: "http://127.0.0.1:5000"
storage:
  max_sessions: 10
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::TravelChatError;

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<()> = Err(TravelChatError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[test]
    fn test_sample_session_is_saveable() {
        let session = sample_session("session_1", "hotels in Oslo");
        assert!(!session.is_welcome_only());
        assert_eq!(session.last_message.as_deref(), Some("hotels in Oslo"));
    }

    #[test]
    fn test_test_config_yaml() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert_eq!(config.storage.max_sessions, 10);
        assert!(config.validate().is_ok());
    }
}
