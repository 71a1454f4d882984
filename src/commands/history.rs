use crate::cli::HistoryCommand;
use crate::config::Config;
use crate::error::Result;
use crate::storage::{group_by_recency, ChatSession, MessageRole, SessionStore};
use chrono::{Local, Utc};
use colored::Colorize;
use prettytable::{format, Table};

/// Handle history commands
pub fn handle_history(config: &Config, command: HistoryCommand) -> Result<()> {
    let store = super::open_session_store(config)?;

    match command {
        HistoryCommand::List => print_sessions(&store.list_sessions()),
        HistoryCommand::Show { id } => match store.get_session(&id) {
            Some(session) => print_transcript(&session),
            None => println!("{}", format!("No conversation with id {}", id).yellow()),
        },
        HistoryCommand::Delete { id } => delete(&store, &id),
    }

    Ok(())
}

fn delete(store: &SessionStore, id: &str) {
    if store.get_session(id).is_none() {
        println!("{}", format!("No conversation with id {}", id).yellow());
        return;
    }

    store.delete_session(id);
    if store.current_session_id().as_deref() == Some(id) {
        store.clear_current_session_id();
    }
    println!("{}", format!("Deleted conversation {}", id).green());
}

/// Print sessions grouped by how recently they were updated
pub fn print_sessions(sessions: &[ChatSession]) {
    if sessions.is_empty() {
        println!("{}", "No conversation history found.".yellow());
        return;
    }

    for (bucket, members) in group_by_recency(sessions, Utc::now()) {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

        table.add_row(prettytable::row![
            "ID".bold(),
            "Title".bold(),
            "Last Message".bold(),
            "Messages".bold(),
            "Last Updated".bold()
        ]);

        for session in members {
            let preview = session.last_message.as_deref().unwrap_or("-");
            let updated = session
                .updated_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string();

            table.add_row(prettytable::row![
                session.id.cyan(),
                truncate(&session.title, 40),
                truncate(preview, 50),
                session.messages.len(),
                updated
            ]);
        }

        println!("\n{}", bucket.label().bold());
        table.printstd();
    }

    println!();
    println!(
        "Use {} to resume a conversation.",
        "travelchat chat --session <ID>".cyan()
    );
    println!();
}

/// Print every message of a session
pub fn print_transcript(session: &ChatSession) {
    println!("\n{} {}", session.title.bold(), format!("({})", session.id).dimmed());
    for message in &session.messages {
        let time = message.timestamp.with_timezone(&Local).format("%H:%M");
        let who = match message.role {
            MessageRole::User if message.is_voice_origin => "You (voice)".green(),
            MessageRole::User => "You".green(),
            MessageRole::Assistant => "Assistant".blue(),
        };
        println!("[{}] {}: {}", time, who, message.content);
        if let Some(results) = message.results() {
            println!("{}", format!("  {} result(s) attached", results.len()).dimmed());
        }
    }
    println!();
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
