//! TravelChat - conversational hotel booking assistant CLI
//!
#![doc = "Main entry point for the TravelChat application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use travelchat::cli::{Cli, Commands};
use travelchat::commands;
use travelchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { session, message } => {
            tracing::info!("Starting interactive chat");
            if let Some(id) = &session {
                tracing::debug!("Resuming conversation: {}", id);
            }
            commands::chat::run_chat(config, session, message).await?;
            Ok(())
        }
        Commands::History { command } => {
            tracing::info!("Starting history command");
            commands::history::handle_history(&config, command)?;
            Ok(())
        }
        Commands::Hotels { command } => {
            tracing::info!("Starting hotel lookup");
            commands::hotels::handle_hotels(&config, command).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "travelchat=debug"
    } else {
        "travelchat=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
