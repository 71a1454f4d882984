//! Speech transcription and synthesis
//!
//! Voice input is transcribed by a remote speech-to-text endpoint and replies
//! can be rendered to audio by a text-to-speech endpoint. Both are opaque
//! services; this module only moves bytes and text across the wire.

use crate::config::SpeechConfig;
use crate::error::{Result, TravelChatError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Remote speech services
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Transcribe recorded audio to text
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String>;

    /// Render text to playable audio bytes
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    voice: String,
}

/// Speech services reached over HTTP (`/stt` and `/tts`)
pub struct HttpSpeechBackend {
    client: Client,
    base_url: String,
}

impl HttpSpeechBackend {
    /// Create a client for the configured speech service
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("travelchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TravelChatError::Speech(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SpeechBackend for HttpSpeechBackend {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String> {
        let url = format!("{}/stt", self.base_url);
        tracing::debug!("Transcribing {} bytes of audio", audio.len());

        let part = Part::bytes(audio).file_name(file_name.to_string());
        let form = Form::new().part("payload", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TravelChatError::Speech(format!("Transcription request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Transcription returned error {}: {}", status, error_text);
            return Err(TravelChatError::Speech(format!(
                "Transcription returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let body: TranscriptionResponse = response.json().await.map_err(|e| {
            TravelChatError::Speech(format!("Failed to parse transcription: {}", e))
        })?;

        let text = body.voice.trim().to_string();
        if text.is_empty() {
            return Err(TravelChatError::Speech("Transcription was empty".to_string()).into());
        }
        Ok(text)
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let url = format!("{}/tts", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&SynthesisRequest { text })
            .send()
            .await
            .map_err(|e| TravelChatError::Speech(format!("Synthesis request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Synthesis returned error {}: {}", status, error_text);
            return Err(TravelChatError::Speech(format!(
                "Synthesis returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| TravelChatError::Speech(format!("Failed to read audio: {}", e)))?;
        Ok(audio.to_vec())
    }
}
