//! Spoken replies
//!
//! [`SpeechPlayer`] turns reply text into audio through a [`SpeechBackend`]
//! and hands it to an [`AudioSink`]. It tracks a small playback state machine
//! and an approximate progress value the chat view can render.

use crate::backend::SpeechBackend;
use crate::error::{Result, TravelChatError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use ulid::Ulid;

/// Message recorded when synthesis or playback fails
pub const PLAYBACK_ERROR: &str = "Failed to play audio. Please try again.";

/// Progress never passes this value until playback actually ends
const MAX_RUNNING_PROGRESS: u8 = 95;
const PROGRESS_STEP: u8 = 2;

/// Wall time between two progress ticks
pub const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Byte rate of a 128 kbit/s mp3 stream, used to estimate clip length
const AUDIO_BYTES_PER_SECOND: u64 = 16_000;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing queued
    Idle,
    /// Waiting for synthesized audio
    Processing,
    /// Audio handed to the sink
    Playing,
    /// Playback suspended
    Paused,
}

/// Destination for synthesized audio
pub trait AudioSink: Send {
    /// Start playing the given audio
    fn play(&mut self, audio: &[u8]) -> Result<()>;

    /// Stop whatever is playing
    fn stop(&mut self);
}

/// Sink that writes each clip to an `.mp3` file in a directory
pub struct FileSink {
    dir: PathBuf,
    last_path: Option<PathBuf>,
    last_len: u64,
}

impl FileSink {
    /// Create a sink writing into `dir` (created on first use)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_path: None,
            last_len: 0,
        }
    }

    /// File written by the most recent `play`
    pub fn last_path(&self) -> Option<&Path> {
        self.last_path.as_deref()
    }

    /// Size in bytes of the most recent clip
    pub fn last_len(&self) -> u64 {
        self.last_len
    }
}

impl AudioSink for FileSink {
    fn play(&mut self, audio: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| TravelChatError::Playback(format!("Failed to create audio dir: {}", e)))?;

        let path = self.dir.join(format!("{}.mp3", Ulid::new()));
        std::fs::write(&path, audio)
            .map_err(|e| TravelChatError::Playback(format!("Failed to write audio: {}", e)))?;

        tracing::info!("Wrote {} bytes of audio to {}", audio.len(), path.display());
        self.last_path = Some(path);
        self.last_len = audio.len() as u64;
        Ok(())
    }

    fn stop(&mut self) {}
}

/// Text-to-speech player
pub struct SpeechPlayer<S: AudioSink> {
    speech: Arc<dyn SpeechBackend>,
    sink: S,
    state: PlaybackState,
    progress: u8,
    error: Option<String>,
}

impl<S: AudioSink> SpeechPlayer<S> {
    /// Create an idle player
    pub fn new(speech: Arc<dyn SpeechBackend>, sink: S) -> Self {
        Self {
            speech,
            sink,
            state: PlaybackState::Idle,
            progress: 0,
            error: None,
        }
    }

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Approximate progress, 0..=100
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Error from the last failed `speak`
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The sink audio is handed to
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Synthesize `text` and start playing it, replacing anything in progress
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or the sink fails; the player is left idle
    /// with [`PLAYBACK_ERROR`] recorded.
    pub async fn speak(&mut self, text: &str) -> Result<()> {
        if self.state != PlaybackState::Idle {
            self.stop();
        }
        self.error = None;
        self.state = PlaybackState::Processing;

        let played = match self.speech.synthesize(text).await {
            Ok(audio) => self.sink.play(&audio),
            Err(e) => Err(e),
        };

        if let Err(e) = played {
            tracing::error!("Speech playback failed: {:#}", e);
            self.state = PlaybackState::Idle;
            self.progress = 0;
            self.error = Some(PLAYBACK_ERROR.to_string());
            return Err(e);
        }

        self.state = PlaybackState::Playing;
        self.progress = 0;
        Ok(())
    }

    /// Advance progress while playing
    pub fn tick(&mut self) {
        if self.state == PlaybackState::Playing {
            self.progress = (self.progress + PROGRESS_STEP).min(MAX_RUNNING_PROGRESS);
        }
    }

    /// Suspend playback
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Continue after `pause`
    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    /// Stop playback and reset progress
    pub fn stop(&mut self) {
        self.sink.stop();
        self.state = PlaybackState::Idle;
        self.progress = 0;
    }

    /// Mark the clip as played to the end
    ///
    /// Progress reads 100 until [`reset_progress`](Self::reset_progress).
    pub fn finish(&mut self) {
        if matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            self.state = PlaybackState::Idle;
            self.progress = 100;
        }
    }

    /// Clear a finished clip's progress
    pub fn reset_progress(&mut self) {
        if self.state == PlaybackState::Idle {
            self.progress = 0;
        }
    }
}

/// Drives a [`SpeechPlayer`] from wall-clock time
///
/// The clip length is estimated from its size. Time spent paused does not
/// count towards it.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    last: Instant,
    carry: Duration,
    played: Duration,
    length: Duration,
}

impl PlaybackClock {
    /// Start timing a clip of `audio_len` bytes
    pub fn start(audio_len: u64, now: Instant) -> Self {
        let millis = (audio_len.saturating_mul(1000) / AUDIO_BYTES_PER_SECOND).max(1000);
        Self::with_length(Duration::from_millis(millis), now)
    }

    /// Start timing a clip of known length
    pub fn with_length(length: Duration, now: Instant) -> Self {
        Self {
            last: now,
            carry: Duration::ZERO,
            played: Duration::ZERO,
            length,
        }
    }

    /// Estimated clip length
    pub fn length(&self) -> Duration {
        self.length
    }

    /// Apply the time elapsed since the last call
    ///
    /// Returns `true` once the clip has played to the end, after which the
    /// player is finished.
    pub fn advance<S: AudioSink>(&mut self, player: &mut SpeechPlayer<S>, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;

        match player.state() {
            PlaybackState::Playing => {}
            PlaybackState::Paused => return false,
            PlaybackState::Idle | PlaybackState::Processing => return true,
        }

        self.played += elapsed;
        if self.played >= self.length {
            player.finish();
            return true;
        }

        self.carry += elapsed;
        while self.carry >= TICK_INTERVAL {
            player.tick();
            self.carry -= TICK_INTERVAL;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FakeSpeech {
        fail: bool,
    }

    #[async_trait]
    impl SpeechBackend for FakeSpeech {
        async fn transcribe(&self, _audio: Vec<u8>, _file_name: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
            if self.fail {
                return Err(TravelChatError::Speech("tts down".to_string()).into());
            }
            Ok(text.as_bytes().to_vec())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        played: Vec<Vec<u8>>,
        stops: usize,
    }

    impl AudioSink for RecordingSink {
        fn play(&mut self, audio: &[u8]) -> Result<()> {
            self.played.push(audio.to_vec());
            Ok(())
        }

        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    fn player(fail: bool) -> SpeechPlayer<RecordingSink> {
        SpeechPlayer::new(Arc::new(FakeSpeech { fail }), RecordingSink::default())
    }

    #[tokio::test]
    async fn test_speak_moves_to_playing() {
        let mut player = player(false);
        assert_eq!(player.state(), PlaybackState::Idle);

        player.speak("hello").await.unwrap();
        assert_eq!(player.state(), PlaybackState::Playing);
        assert_eq!(player.progress(), 0);
        assert_eq!(player.sink().played, vec![b"hello".to_vec()]);
    }

    #[tokio::test]
    async fn test_progress_caps_until_finish() {
        let mut player = player(false);
        player.speak("hello").await.unwrap();

        for _ in 0..100 {
            player.tick();
        }
        assert_eq!(player.progress(), 95);

        player.finish();
        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(player.progress(), 100);

        player.reset_progress();
        assert_eq!(player.progress(), 0);
    }

    #[tokio::test]
    async fn test_pause_freezes_progress() {
        let mut player = player(false);
        player.speak("hello").await.unwrap();
        player.tick();
        player.pause();
        player.tick();
        assert_eq!(player.state(), PlaybackState::Paused);
        assert_eq!(player.progress(), 2);

        player.resume();
        player.tick();
        assert_eq!(player.progress(), 4);
    }

    #[tokio::test]
    async fn test_speak_again_stops_current_clip() {
        let mut player = player(false);
        player.speak("one").await.unwrap();
        player.speak("two").await.unwrap();
        assert_eq!(player.sink().stops, 1);
        assert_eq!(player.sink().played.len(), 2);
    }

    #[tokio::test]
    async fn test_synthesis_failure_records_error() {
        let mut player = player(true);
        assert!(player.speak("hello").await.is_err());
        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(player.error(), Some(PLAYBACK_ERROR));
        assert!(player.sink().played.is_empty());
    }

    #[tokio::test]
    async fn test_stop_resets() {
        let mut player = player(false);
        player.speak("hello").await.unwrap();
        player.tick();
        player.stop();
        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(player.progress(), 0);
    }

    #[test]
    fn test_file_sink_writes_clip() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path().join("audio"));
        sink.play(b"ID3").unwrap();

        let path = sink.last_path().unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("mp3"));
        assert_eq!(std::fs::read(path).unwrap(), b"ID3");
        assert_eq!(sink.last_len(), 3);
    }

    #[test]
    fn test_clock_length_estimated_from_size() {
        let now = Instant::now();
        assert_eq!(PlaybackClock::start(48_000, now).length(), Duration::from_secs(3));
        assert_eq!(PlaybackClock::start(10, now).length(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_clock_ticks_with_elapsed_time() {
        let mut player = player(false);
        player.speak("hello").await.unwrap();
        let start = Instant::now();
        let mut clock = PlaybackClock::with_length(Duration::from_secs(60), start);

        assert!(!clock.advance(&mut player, start + Duration::from_millis(1200)));
        assert_eq!(player.progress(), 4);

        assert!(!clock.advance(&mut player, start + Duration::from_millis(1500)));
        assert_eq!(player.progress(), 6);
        assert_eq!(player.state(), PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_clock_ignores_paused_time() {
        let mut player = player(false);
        player.speak("hello").await.unwrap();
        let start = Instant::now();
        let mut clock = PlaybackClock::with_length(Duration::from_secs(2), start);

        assert!(!clock.advance(&mut player, start + Duration::from_millis(1000)));
        player.pause();
        assert!(!clock.advance(&mut player, start + Duration::from_secs(30)));
        assert_eq!(player.state(), PlaybackState::Paused);
        assert_eq!(player.progress(), 4);

        player.resume();
        assert!(!clock.advance(&mut player, start + Duration::from_millis(30_500)));
        assert_eq!(player.progress(), 6);
    }

    #[tokio::test]
    async fn test_clock_finishes_at_clip_end() {
        let mut player = player(false);
        player.speak("hello").await.unwrap();
        let start = Instant::now();
        let mut clock = PlaybackClock::with_length(Duration::from_secs(2), start);

        assert!(clock.advance(&mut player, start + Duration::from_secs(3)));
        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(player.progress(), 100);
    }

    #[tokio::test]
    async fn test_clock_done_after_stop() {
        let mut player = player(false);
        player.speak("hello").await.unwrap();
        let start = Instant::now();
        let mut clock = PlaybackClock::with_length(Duration::from_secs(60), start);

        player.stop();
        assert!(clock.advance(&mut player, start + Duration::from_secs(1)));
        assert_eq!(player.progress(), 0);
    }
}
