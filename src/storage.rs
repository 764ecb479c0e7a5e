//! Namespaced key-value persistence
//!
//! Each key maps to one JSON file inside the data directory. Callers above
//! this layer never see a failure: loads degrade to "nothing stored" and
//! saves report a bool after logging.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::state::ChatState;
use crate::theme::ThemeSetting;

pub const STATE_KEY: &str = "simple-chat:v1";
pub const THEME_KEY: &str = "simple-chat:theme";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON under key {key}: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key.replace(':', "-")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, value).map_err(|source| StorageError::Io { path, source })
    }
}

fn read_json(store: &dyn KeyValueStore, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Json {
            key: key.to_string(),
            source,
        })
}

fn write_json<T: serde::Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Json {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

/// Load chat state. Missing or unreadable data yields `None`.
pub fn load_state(store: &dyn KeyValueStore) -> Option<ChatState> {
    match read_json(store, STATE_KEY) {
        Ok(Some(value)) => Some(ChatState::from_json(value)),
        Ok(None) => None,
        Err(err) => {
            tracing::warn!("Failed to load state: {}", err);
            None
        }
    }
}

pub fn save_state(store: &dyn KeyValueStore, state: &ChatState) -> bool {
    match write_json(store, STATE_KEY, state) {
        Ok(()) => true,
        Err(err) => {
            tracing::error!("Failed to save state: {}", err);
            false
        }
    }
}

/// The theme key holds a bare `auto|light|dark`. A JSON-quoted value is
/// accepted too; anything else reads as `Auto`.
pub fn load_theme(store: &dyn KeyValueStore) -> ThemeSetting {
    match store.get(THEME_KEY) {
        Ok(Some(raw)) => {
            let value = raw.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            ThemeSetting::from_str(value).unwrap_or_default()
        }
        Ok(None) => ThemeSetting::default(),
        Err(err) => {
            tracing::warn!("Failed to load theme: {}", err);
            ThemeSetting::default()
        }
    }
}

pub fn save_theme(store: &dyn KeyValueStore, setting: ThemeSetting) -> bool {
    match store.set(THEME_KEY, setting.as_str()) {
        Ok(()) => true,
        Err(err) => {
            tracing::error!("Failed to save theme: {}", err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Chat, Message};

    fn temp_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("data"));
        (dir, store)
    }

    #[test]
    fn test_missing_state_loads_as_none() {
        let (_dir, store) = temp_store();
        assert!(load_state(&store).is_none());
    }

    #[test]
    fn test_state_round_trip() {
        let (_dir, store) = temp_store();
        let mut chat = Chat::new();
        chat.messages.push(Message::user("Hello"));
        chat.messages.push(Message::placeholder());
        chat.refresh_title();
        let state = ChatState {
            active_chat_id: Some(chat.id.clone()),
            chats: vec![chat, Chat::new()],
        };

        assert!(save_state(&store, &state));
        assert_eq!(load_state(&store), Some(state));
    }

    #[test]
    fn test_malformed_state_loads_as_none() {
        let (_dir, store) = temp_store();
        store.set(STATE_KEY, "{ not json").unwrap();
        assert!(load_state(&store).is_none());
    }

    #[test]
    fn test_key_maps_to_file() {
        let (dir, store) = temp_store();
        assert!(save_state(&store, &ChatState::default()));
        assert!(dir.path().join("data").join("simple-chat-v1.json").exists());
    }

    #[test]
    fn test_save_failure_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the directory should be makes create_dir_all fail
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, "").unwrap();
        let store = FileStore::new(&blocker);
        assert!(!save_state(&store, &ChatState::default()));
        assert!(load_state(&store).is_none());
    }

    #[test]
    fn test_theme_round_trip() {
        let (_dir, store) = temp_store();
        assert_eq!(load_theme(&store), ThemeSetting::Auto);
        assert!(save_theme(&store, ThemeSetting::Dark));
        assert_eq!(load_theme(&store), ThemeSetting::Dark);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_bare_theme_value_loads() {
        let (_dir, store) = temp_store();
        store.set(THEME_KEY, "dark").unwrap();
        assert_eq!(load_theme(&store), ThemeSetting::Dark);
        store.set(THEME_KEY, "light\n").unwrap();
        assert_eq!(load_theme(&store), ThemeSetting::Light);
        store.set(THEME_KEY, "\"dark\"").unwrap();
        assert_eq!(load_theme(&store), ThemeSetting::Dark);
    }

    #[test]
    fn test_unknown_theme_falls_back_to_auto() {
        let (_dir, store) = temp_store();
        store.set(THEME_KEY, "\"neon\"").unwrap();
        assert_eq!(load_theme(&store), ThemeSetting::Auto);
    }

    #[test]
    fn test_keys_are_independent() {
        let (_dir, store) = temp_store();
        save_theme(&store, ThemeSetting::Light);
        assert!(load_state(&store).is_none());
        save_state(&store, &ChatState::default());
        assert_eq!(load_theme(&store), ThemeSetting::Light);
    }
}
