/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`    - Interactive travel chat
- `history` - List, show and delete stored conversations
- `hotels`  - Direct hotel lookups against the backend
*/

use crate::config::Config;
use crate::error::Result;
use crate::storage::{default_storage_path, SessionStore, SledStore};
use std::sync::Arc;

// Special commands parser for the chat loop
pub mod special_commands;

// Stored conversation commands
pub mod history;

// Hotel lookup commands
pub mod hotels;

/// Open the session store described by the configuration
///
/// # Errors
///
/// Returns error if the storage location cannot be opened
pub fn open_session_store(config: &Config) -> Result<SessionStore> {
    let path = match &config.storage.path {
        Some(path) => path.clone(),
        None => default_storage_path()?,
    };
    let backend = SledStore::open(&path)?;
    tracing::debug!("Opened session storage at {}", path.display());
    Ok(SessionStore::with_capacity(
        Arc::new(backend),
        config.storage.max_sessions,
    ))
}

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Builds the assistant backend and a [`ConversationController`], then runs
    //! a readline loop that sends each line to the assistant. Slash commands
    //! manage stored conversations and voice features.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use crate::backend::{AssistantBackend, HttpAssistantBackend, HttpSpeechBackend};
    use crate::controller::ConversationController;
    use crate::playback::{FileSink, PlaybackClock, PlaybackState, SpeechPlayer};
    use crate::storage::{ChatMessage, MessageRole};
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use serde_json::Value;
    use std::time::Instant;

    /// Start interactive chat
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `session` - Stored conversation to resume, if any
    /// * `message` - Message to send before the prompt appears
    ///
    /// # Examples
    ///
    /// ```
    /// use travelchat::commands::chat;
    /// use travelchat::config::Config;
    ///
    /// // In application code:
    /// // chat::run_chat(Config::default(), None, None).await?;
    /// ```
    pub async fn run_chat(
        config: Config,
        session: Option<String>,
        message: Option<String>,
    ) -> Result<()> {
        let store = open_session_store(&config)?;
        let backend: Arc<dyn AssistantBackend> =
            Arc::new(HttpAssistantBackend::new(&config.backend)?);

        let mut controller = match &session {
            Some(id) => ConversationController::resume(store, backend, id),
            None => ConversationController::new(store, backend),
        };

        let mut voice = None;
        if config.speech.enabled {
            let speech = Arc::new(HttpSpeechBackend::new(&config.speech)?);
            voice = Some(Voice::new(SpeechPlayer::new(
                speech.clone(),
                FileSink::new(config.speech.audio_dir()),
            )));
            controller = controller.with_speech(speech);
        }

        if let Some(id) = &session {
            if controller.session_id() != id {
                println!(
                    "{}",
                    format!("No conversation with id {}; starting a new chat.", id).yellow()
                );
            }
        }

        print_welcome_banner(&controller);

        if let Some(text) = message {
            println!("{} {}", "You:".green().bold(), text);
            if let Some(reply) = controller.send_message(&text).await {
                print_reply(&reply, voice.as_mut()).await;
            }
        }

        let mut rl = DefaultEditor::new()?;

        loop {
            if let Some(voice) = voice.as_mut() {
                voice.sync();
            }
            let prompt = match voice.as_ref().and_then(Voice::status) {
                Some(status) => format!("{} {} ", status.dimmed(), "[travel]>>".cyan()),
                None => format!("{} ", "[travel]>>".cyan()),
            };

            match rl.readline(&prompt) {
                Ok(line) => {
                    if let Some(voice) = voice.as_mut() {
                        voice.sync();
                    }
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(trimmed);

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e);
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::NewChat => {
                            controller.new_chat();
                            print_welcome_banner(&controller);
                        }
                        SpecialCommand::ListSessions => {
                            super::history::print_sessions(&controller.store().list_sessions());
                        }
                        SpecialCommand::Open(id) => {
                            if controller.select_session(&id) {
                                super::history::print_transcript(controller.session());
                            } else {
                                println!(
                                    "{}",
                                    format!("No conversation with id {}; started a new chat.", id)
                                        .yellow()
                                );
                            }
                        }
                        SpecialCommand::Delete(id) => {
                            let id = id.unwrap_or_else(|| controller.session_id().to_string());
                            controller.delete_session(&id);
                            println!("{}", format!("Deleted conversation {}", id).green());
                        }
                        SpecialCommand::Voice(path) => {
                            let audio = match std::fs::read(&path) {
                                Ok(audio) => audio,
                                Err(e) => {
                                    eprintln!("Failed to read {}: {}\n", path.display(), e);
                                    continue;
                                }
                            };
                            let file_name = path
                                .file_name()
                                .and_then(|name| name.to_str())
                                .unwrap_or("recording.webm")
                                .to_string();

                            match controller.send_voice(audio, &file_name).await {
                                Ok(reply) => {
                                    if let Some(heard) = last_user_message(&controller) {
                                        println!("{} {}", "You (voice):".green().bold(), heard);
                                    }
                                    print_reply(&reply, voice.as_mut()).await;
                                }
                                Err(e) => eprintln!("Error: {}\n", e),
                            }
                        }
                        SpecialCommand::Speak => match voice.as_mut() {
                            Some(voice) => {
                                let last = controller
                                    .messages()
                                    .iter()
                                    .rev()
                                    .find(|m| m.role == MessageRole::Assistant)
                                    .map(|m| m.content.clone());
                                if let Some(text) = last {
                                    voice.play(&text).await;
                                }
                            }
                            None => println!("{}", "Speech is not enabled.".yellow()),
                        },
                        SpecialCommand::Pause => match voice.as_mut() {
                            Some(voice) => voice.pause(),
                            None => println!("{}", "Speech is not enabled.".yellow()),
                        },
                        SpecialCommand::Resume => match voice.as_mut() {
                            Some(voice) => voice.resume(),
                            None => println!("{}", "Speech is not enabled.".yellow()),
                        },
                        SpecialCommand::Stop => match voice.as_mut() {
                            Some(voice) => voice.stop(),
                            None => println!("{}", "Speech is not enabled.".yellow()),
                        },
                        SpecialCommand::Help => print_help(),
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {
                            if let Some(reply) = controller.send_message(trimmed).await {
                                print_reply(&reply, voice.as_mut()).await;
                            }
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn last_user_message(controller: &ConversationController) -> Option<&str> {
        controller
            .messages()
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }

    async fn print_reply(reply: &ChatMessage, voice: Option<&mut Voice>) {
        println!("\n{} {}", "Assistant:".blue().bold(), reply.content);
        if let Some(results) = reply.results() {
            print_results(results);
        }
        println!();

        if reply.auto_play {
            if let Some(voice) = voice {
                voice.play(&reply.content).await;
            }
        }
    }

    /// Speech player and the clock that advances it between prompts
    struct Voice {
        player: SpeechPlayer<FileSink>,
        clock: Option<PlaybackClock>,
    }

    impl Voice {
        fn new(player: SpeechPlayer<FileSink>) -> Self {
            Self {
                player,
                clock: None,
            }
        }

        async fn play(&mut self, text: &str) {
            self.clock = None;
            if self.player.speak(text).await.is_err() {
                eprintln!("{}\n", self.player.error().unwrap_or_default());
                return;
            }

            let sink = self.player.sink();
            if let Some(path) = sink.last_path() {
                println!("{} {}\n", "Audio:".dimmed(), path.display());
            }
            self.clock = Some(PlaybackClock::start(sink.last_len(), Instant::now()));
        }

        /// Bring playback up to the current time
        fn sync(&mut self) {
            let finished = match self.clock.as_mut() {
                Some(clock) => clock.advance(&mut self.player, Instant::now()),
                None => return,
            };
            if finished {
                self.clock = None;
                if self.player.progress() == 100 {
                    println!("{}", "Playback finished.".dimmed());
                }
                self.player.reset_progress();
            }
        }

        fn pause(&mut self) {
            self.sync();
            if self.player.state() == PlaybackState::Playing {
                self.player.pause();
                println!("{}", format!("Paused at {}%.", self.player.progress()).dimmed());
            } else {
                println!("{}", "Nothing is playing.".yellow());
            }
        }

        fn resume(&mut self) {
            self.sync();
            if self.player.state() == PlaybackState::Paused {
                self.player.resume();
                println!("{}", "Resumed.".dimmed());
            } else {
                println!("{}", "Nothing is paused.".yellow());
            }
        }

        fn stop(&mut self) {
            self.sync();
            if self.clock.take().is_some() {
                self.player.stop();
                println!("{}", "Stopped.".dimmed());
            } else {
                println!("{}", "Nothing is playing.".yellow());
            }
        }

        /// Prompt prefix while a clip is playing or paused
        fn status(&self) -> Option<String> {
            match self.player.state() {
                PlaybackState::Playing => Some(format!("[playing {}%]", self.player.progress())),
                PlaybackState::Paused => Some(format!("[paused {}%]", self.player.progress())),
                PlaybackState::Idle | PlaybackState::Processing => None,
            }
        }
    }

    fn print_results(results: &[Value]) {
        for (index, result) in results.iter().enumerate() {
            let field = |key: &str| result.get(key).map(display_value);
            let name = field("name").unwrap_or_else(|| format!("Result {}", index + 1));
            let mut details = Vec::new();
            if let Some(location) = field("location") {
                details.push(location);
            }
            if let Some(price) = field("price") {
                details.push(format!("${}", price));
            }
            if let Some(rating) = field("rating") {
                details.push(format!("{} stars", rating));
            }

            if details.is_empty() {
                println!("  {}. {}", index + 1, name.bold());
            } else {
                println!("  {}. {} ({})", index + 1, name.bold(), details.join(", "));
            }
        }
    }

    fn display_value(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn print_welcome_banner(controller: &ConversationController) {
        println!();
        println!("{}", controller.title().bold());
        println!("{}", format!("Session {}", controller.session_id()).dimmed());
        for message in controller.messages() {
            let who = match message.role {
                MessageRole::User => "You:".green().bold(),
                MessageRole::Assistant => "Assistant:".blue().bold(),
            };
            println!("{} {}", who, message.content);
        }
        println!("{}", "Type /help for commands.".dimmed());
        println!();
    }

}
