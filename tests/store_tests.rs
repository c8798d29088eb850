use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use xlchat_cli::chat::{Conversation, ConversationStore, JsonConversationStore, Role};
use xlchat_cli::config::{Config, API_URL_ENV, DEFAULT_API_URL};

fn conv(id: &str, created_at: u64) -> Conversation {
    let mut c = Conversation::new(id);
    c.created_at = created_at;
    c
}

// ── JsonConversationStore ─────────────────────────────────────────────────────

#[test]
fn missing_file_opens_empty() {
    let dir = TempDir::new().unwrap();
    let store = JsonConversationStore::open(dir.path().join("none.json")).unwrap();
    assert!(store.is_empty());
}

#[test]
fn persist_and_reopen_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("conversations.json");
    let mut store = JsonConversationStore::open(&path).unwrap();
    let mut c = conv("a", 1);
    c.attach_files(["sales.xlsx"]);
    c.push(Role::User, "hi");
    c.push(Role::Bot, "hello");
    store.insert(c.clone());
    store.persist().unwrap();

    let reopened = JsonConversationStore::open(&path).unwrap();
    assert_eq!(reopened.get("a"), Some(&c));
    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"role\": \"bot\""));
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conversations.json");
    fs::write(&path, "{not json").unwrap();
    let err = JsonConversationStore::open(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse"));
}

#[test]
fn list_is_newest_first() {
    let mut store = JsonConversationStore::in_memory();
    store.insert(conv("old", 10));
    store.insert(conv("new", 30));
    store.insert(conv("mid", 20));
    let ids: Vec<&str> = store.list().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);
}

#[test]
fn update_title_and_remove() {
    let mut store = JsonConversationStore::in_memory();
    store.insert(conv("a", 1));
    store.update_title("a", "Sales");
    assert_eq!(store.get("a").unwrap().title, "Sales");
    store.update_title("missing", "ignored");
    assert!(store.remove("a").is_some());
    assert!(store.is_empty());
}

#[test]
fn in_memory_persist_is_a_noop() {
    let mut store = JsonConversationStore::in_memory();
    store.insert(conv("a", 1));
    assert!(store.persist().is_ok());
    assert_eq!(store.len(), 1);
}

#[test]
fn attach_files_skips_duplicates() {
    let mut c = Conversation::new("a");
    c.attach_files(["a.xlsx", "b.xlsx"]);
    c.attach_files(["b.xlsx", "c.xlsx"]);
    assert_eq!(c.files, vec!["a.xlsx", "b.xlsx", "c.xlsx"]);
    assert!(c.has_files());
}

#[test]
fn clear_files_forgets_uploads() {
    let mut c = Conversation::new("a");
    c.attach_files(["a.xlsx"]);
    c.clear_files();
    assert!(!c.has_files());
}

#[test]
fn delete_command_removes_and_persists() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        api_base_url: DEFAULT_API_URL.to_string(),
        data_dir: dir.path().to_path_buf(),
    };
    let mut store = JsonConversationStore::open(config.conversations_path()).unwrap();
    store.insert(conv("a", 1));
    store.insert(conv("b", 2));
    store.persist().unwrap();

    xlchat_cli::delete(&config, "a").unwrap();

    let reopened = JsonConversationStore::open(config.conversations_path()).unwrap();
    assert!(reopened.get("a").is_none());
    assert!(reopened.get("b").is_some());
    assert!(xlchat_cli::delete(&config, "a").is_err());
}

// ── Config ────────────────────────────────────────────────────────────────────

#[test]
fn default_config_points_at_local_backend() {
    let config = Config::default();
    assert_eq!(config.api_base_url, DEFAULT_API_URL);
    assert!(config.conversations_path().ends_with("conversations.json"));
}

#[test]
fn config_file_values_are_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "api_base_url = \"http://example.test:8000/\"\ndata_dir = \"/tmp/xl\"\n").unwrap();
    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.api_base_url, "http://example.test:8000");
    assert_eq!(config.data_dir, PathBuf::from("/tmp/xl"));
    assert_eq!(config.log_path(), PathBuf::from("/tmp/xl/xlchat.log"));
}

#[test]
fn partial_config_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "data_dir = \"/tmp/xl\"\n").unwrap();
    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.api_base_url, DEFAULT_API_URL);
}

#[test]
fn env_and_flag_override_in_order() {
    let mut config = Config::default();
    config.apply_env(|key| (key == API_URL_ENV).then(|| "http://env:1/".to_string()));
    assert_eq!(config.api_base_url, "http://env:1");
    let config = config.with_api_url(Some("http://flag:2".to_string()));
    assert_eq!(config.api_base_url, "http://flag:2");
    let config = config.with_api_url(None);
    assert_eq!(config.api_base_url, "http://flag:2");
}

#[test]
fn blank_env_value_is_ignored() {
    let mut config = Config::default();
    config.apply_env(|_| Some("  ".to_string()));
    assert_eq!(config.api_base_url, DEFAULT_API_URL);
}
