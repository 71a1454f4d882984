use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use travelchat::storage::{ChatMessage, ChatSession, SessionStore, SledStore};

#[allow(dead_code)]
pub fn create_temp_store() -> (SessionStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = open_store_at(&tmp.path().join("history"));
    (store, tmp)
}

#[allow(dead_code)]
pub fn open_store_at(path: &std::path::Path) -> SessionStore {
    let backend = SledStore::open(path).expect("failed to open sled store");
    SessionStore::new(Arc::new(backend))
}

#[allow(dead_code)]
pub fn session_with_user_message(id: &str, text: &str) -> ChatSession {
    let mut session = ChatSession::new(id, "New Chat");
    session.push(ChatMessage::greeting());
    session.push(ChatMessage::user(text));
    session
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
