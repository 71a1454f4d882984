//! Special commands parser for interactive chat mode
//!
//! Special commands manage the conversation itself rather than being sent to
//! the assistant:
//! - Start a new chat or switch to a stored one
//! - List and delete stored chats
//! - Send a recorded voice clip or replay the last reply as audio
//! - Pause, resume and stop the clip being played
//! - Display help and exit
//!
//! Commands are prefixed with `/`; the command word is case-insensitive,
//! its argument is taken verbatim.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a fresh conversation
    NewChat,

    /// List stored conversations
    ListSessions,

    /// Switch to a stored conversation
    Open(String),

    /// Delete a stored conversation; `None` deletes the open one
    Delete(Option<String>),

    /// Transcribe an audio file and send it as a voice message
    Voice(PathBuf),

    /// Play the last assistant reply as audio
    Speak,

    /// Pause the clip being played
    Pause,

    /// Resume a paused clip
    Resume,

    /// Stop the clip being played
    Stop,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; send the input to the assistant
    None,
}

/// Parse user input into a special command
///
/// # Examples
///
/// ```
/// use travelchat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewChat);
/// assert_eq!(
///     parse_special_command("/open session_1720000000000").unwrap(),
///     SpecialCommand::Open("session_1720000000000".to_string())
/// );
/// assert_eq!(parse_special_command("hotels in Paris").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // If input doesn't start with "/", it's not a command (except exit/quit)
    if !trimmed.starts_with('/') {
        return Ok(match lower.as_str() {
            "exit" | "quit" => SpecialCommand::Exit,
            _ => SpecialCommand::None,
        });
    }

    let (word, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match word.as_str() {
        "/new" => Ok(SpecialCommand::NewChat),
        "/sessions" | "/history" => Ok(SpecialCommand::ListSessions),
        "/open" => required(arg, "/open", "/open <session-id>").map(SpecialCommand::Open),
        "/delete" => Ok(SpecialCommand::Delete(
            (!arg.is_empty()).then(|| arg.to_string()),
        )),
        "/voice" => required(arg, "/voice", "/voice <audio-file>")
            .map(|path| SpecialCommand::Voice(PathBuf::from(path))),
        "/speak" => Ok(SpecialCommand::Speak),
        "/pause" => Ok(SpecialCommand::Pause),
        "/resume" => Ok(SpecialCommand::Resume),
        "/stop" => Ok(SpecialCommand::Stop),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

fn required(arg: &str, command: &str, usage: &str) -> Result<String, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument {
            command: command.to_string(),
            usage: usage.to_string(),
        });
    }
    Ok(arg.to_string())
}

/// Print the special command reference
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

CONVERSATIONS:
  /new              - Start a new chat
  /sessions         - List stored chats
  /open <id>        - Switch to a stored chat
  /delete [id]      - Delete a stored chat (default: the open one)

VOICE:
  /voice <file>     - Send a recorded audio clip as a message
  /speak            - Play the last reply as audio
  /pause            - Pause playback
  /resume           - Resume paused playback
  /stop             - Stop playback

OTHER:
  /help             - Show this help
  /exit, /quit      - Leave the chat
"#
    );
}
