//! Configuration management for TravelChat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, TravelChatError};
use crate::storage::DEFAULT_MAX_SESSIONS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for TravelChat
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Assistant backend settings
    #[serde(default)]
    pub backend: BackendConfig,
    /// Speech service settings
    #[serde(default)]
    pub speech: SpeechConfig,
    /// Local chat history settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Assistant backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the booking service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Speech service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Enable voice input and spoken replies
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the speech service (`/stt`, `/tts`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout (seconds)
    #[serde(default = "default_speech_timeout")]
    pub timeout_seconds: u64,

    /// Directory synthesized audio is written to; defaults to the system temp dir
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_speech_timeout() -> u64 {
    60
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            timeout_seconds: default_speech_timeout(),
            output_dir: None,
        }
    }
}

impl SpeechConfig {
    /// Directory audio files are written to
    pub fn audio_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("travelchat-audio"))
    }
}

/// Local chat history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database directory; defaults to the user's data directory
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Number of sessions kept before the oldest insert is dropped
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_sessions: default_max_sessions(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TravelChatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| TravelChatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("TRAVELCHAT_BACKEND_URL") {
            self.backend.base_url = url;
        }

        if let Ok(timeout) = std::env::var("TRAVELCHAT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.backend.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid TRAVELCHAT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(url) = std::env::var("TRAVELCHAT_SPEECH_URL") {
            self.speech.base_url = url;
        }

        if let Ok(enabled) = std::env::var("TRAVELCHAT_SPEECH_ENABLED") {
            match enabled.parse::<bool>() {
                Ok(v) => {
                    self.speech.enabled = v;
                    tracing::debug!(enabled = v, "Env override: TRAVELCHAT_SPEECH_ENABLED");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for TRAVELCHAT_SPEECH_ENABLED: {}", enabled);
                }
            }
        }

        if let Ok(path) = std::env::var("TRAVELCHAT_STORAGE_PATH") {
            tracing::debug!(path = %path, "Env override: TRAVELCHAT_STORAGE_PATH");
            self.storage.path = Some(PathBuf::from(path));
        }

        if let Ok(max) = std::env::var("TRAVELCHAT_MAX_SESSIONS") {
            if let Ok(value) = max.parse() {
                self.storage.max_sessions = value;
            } else {
                tracing::warn!("Invalid TRAVELCHAT_MAX_SESSIONS: {}", max);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(path) = &cli.storage_path {
            tracing::info!("Using storage path override from CLI: {}", path.display());
            self.storage.path = Some(path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        validate_url("backend.base_url", &self.backend.base_url)?;

        if self.backend.timeout_seconds == 0 {
            return Err(TravelChatError::Config(
                "backend.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.speech.enabled {
            validate_url("speech.base_url", &self.speech.base_url)?;
            if self.speech.timeout_seconds == 0 {
                return Err(TravelChatError::Config(
                    "speech.timeout_seconds must be greater than 0".to_string(),
                )
                .into());
            }
        }

        if self.storage.max_sessions == 0 {
            return Err(TravelChatError::Config(
                "storage.max_sessions must be greater than 0".to_string(),
            )
            .into());
        }

        if self.storage.max_sessions > 1000 {
            return Err(TravelChatError::Config(
                "storage.max_sessions must be less than or equal to 1000".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

fn validate_url(field: &str, raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| TravelChatError::Config(format!("Invalid {}: {} ({})", field, raw, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(TravelChatError::Config(format!(
            "Invalid {}: unsupported scheme '{}'",
            field, other
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::test_utils::{assert_error_contains, create_test_file, temp_dir, test_config_yaml};
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.backend.timeout_seconds, 30);
        assert!(!config.speech.enabled);
        assert_eq!(config.storage.max_sessions, 50);
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = Config::default();
        config.backend.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_non_http_scheme() {
        let mut config = Config::default();
        config.backend.base_url = "ftp://example.com".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.backend.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_speech_checked_only_when_enabled() {
        let mut config = Config::default();
        config.speech.base_url = "bogus".to_string();
        assert!(config.validate().is_ok());
        config.speech.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_max_sessions_range() {
        let mut config = Config::default();
        config.storage.max_sessions = 0;
        assert!(config.validate().is_err());
        config.storage.max_sessions = 1001;
        assert!(config.validate().is_err());
        config.storage.max_sessions = 1000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
backend:
  base_url: "https://booking.example.com"
  timeout_seconds: 10
speech:
  enabled: true
  base_url: "https://speech.example.com"
storage:
  path: "/tmp/travelchat"
  max_sessions: 20
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.backend.base_url, "https://booking.example.com");
        assert_eq!(config.backend.timeout_seconds, 10);
        assert!(config.speech.enabled);
        assert_eq!(config.speech.timeout_seconds, 60);
        assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/travelchat")));
        assert_eq!(config.storage.max_sessions, 20);
    }

    #[test]
    fn test_config_from_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("backend:\n  timeout_seconds: 5\n").unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.storage.max_sessions, 50);
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        let cli = Cli::default();
        let config = Config::load("/nonexistent/config.yaml", &cli).unwrap();
        assert_eq!(config.storage.max_sessions, 50);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("TRAVELCHAT_BACKEND_URL", "http://backend.test:9000");
        std::env::set_var("TRAVELCHAT_MAX_SESSIONS", "12");
        std::env::set_var("TRAVELCHAT_SPEECH_ENABLED", "true");

        let mut config = Config::default();
        config.apply_env_vars();

        std::env::remove_var("TRAVELCHAT_BACKEND_URL");
        std::env::remove_var("TRAVELCHAT_MAX_SESSIONS");
        std::env::remove_var("TRAVELCHAT_SPEECH_ENABLED");

        assert_eq!(config.backend.base_url, "http://backend.test:9000");
        assert_eq!(config.storage.max_sessions, 12);
        assert!(config.speech.enabled);
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_are_ignored() {
        std::env::set_var("TRAVELCHAT_TIMEOUT_SECONDS", "soon");
        let mut config = Config::default();
        config.apply_env_vars();
        std::env::remove_var("TRAVELCHAT_TIMEOUT_SECONDS");

        assert_eq!(config.backend.timeout_seconds, 30);
    }

    #[test]
    fn test_cli_storage_path_override() {
        let cli = Cli {
            storage_path: Some(PathBuf::from("/tmp/override")),
            ..Cli::default()
        };
        let mut config = Config::default();
        config.apply_cli_overrides(&cli);
        assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/override")));
    }

    #[test]
    #[serial]
    fn test_load_reads_yaml_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "config.yaml", &test_config_yaml());
        let config = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap();
        assert_eq!(config.backend.timeout_seconds, 5);
        assert_eq!(config.storage.max_sessions, 10);
    }

    #[test]
    #[serial]
    fn test_load_rejects_malformed_yaml() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "config.yaml", "backend: [unclosed");
        assert_error_contains(
            Config::load(path.to_str().unwrap(), &Cli::default()),
            "config",
        );
    }

    #[test]
    fn test_audio_dir_default() {
        let config = SpeechConfig::default();
        assert!(config.audio_dir().ends_with("travelchat-audio"));
    }
}
