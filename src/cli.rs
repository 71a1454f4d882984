//! Command-line interface definition for TravelChat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chatting, browsing history, and hotel lookups.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TravelChat - conversational hotel booking assistant
///
/// Chat with the booking assistant, keep a local history of conversations,
/// and look up hotels.
#[derive(Parser, Debug, Clone)]
#[command(name = "travelchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Chat history directory (overrides config)
    #[arg(long, env = "TRAVELCHAT_STORAGE_PATH")]
    pub storage_path: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for TravelChat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat with the assistant
    Chat {
        /// Resume a stored session by id
        #[arg(short, long)]
        session: Option<String>,

        /// Send this message as soon as the chat opens
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Manage stored conversations
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Look up hotels
    Hotels {
        /// Hotel subcommand
        #[command(subcommand)]
        command: HotelCommand,
    },
}

/// History management subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum HistoryCommand {
    /// List stored conversations grouped by recency
    List,

    /// Print a stored conversation
    Show {
        /// Session id
        id: String,
    },

    /// Delete a stored conversation
    Delete {
        /// Session id
        id: String,
    },
}

/// Hotel lookup subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum HotelCommand {
    /// Search hotels with a free-text query
    Search {
        /// Search query, e.g. "Paris near the Louvre"
        query: String,
    },

    /// Show details of one hotel
    Show {
        /// Hotel id
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            storage_path: None,
            verbose: false,
            command: Commands::History {
                command: HistoryCommand::List,
            },
        }
    }
}
