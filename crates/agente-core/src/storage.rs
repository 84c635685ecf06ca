//! Local persistence for the user session and the chat transcript.
//!
//! Two independent string keys hold JSON values. Reads that fail for any
//! reason come back as "nothing saved"; writes that fail are logged and
//! dropped. Nothing in here can take the application down.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{debug, error};

use crate::error::{AgentError, Result};
use crate::state::{Message, UserState};

pub const USER_KEY: &str = "agente_cirurgico_user_v1";
pub const CHAT_KEY: &str = "agente_cirurgico_chat_v1";

/// A string-keyed store of string values
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removing a key that does not exist is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AgentError::Storage(format!("invalid key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        // Write to a sibling temp file first so a crash never leaves half a record
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, used by tests and when no data directory is available
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| AgentError::Storage("memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AgentError::Storage("memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AgentError::Storage("memory store lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Typed access to the two persisted records
pub struct Storage {
    store: Box<dyn KeyValueStore>,
}

impl Storage {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileStore::new(dir))
    }

    pub fn save_user(&self, user: &UserState) {
        self.write(USER_KEY, user);
    }

    pub fn load_user(&self) -> Option<UserState> {
        self.read(USER_KEY)
    }

    pub fn clear_user(&self) {
        self.remove(USER_KEY);
    }

    pub fn save_chat(&self, messages: &[Message]) {
        self.write(CHAT_KEY, &messages);
    }

    /// Timestamps come back as `DateTime<Utc>` through serde, so the loaded
    /// transcript compares equal to what was saved.
    pub fn load_chat(&self) -> Option<Vec<Message>> {
        self.read(CHAT_KEY)
    }

    pub fn clear_chat(&self) {
        self.remove(CHAT_KEY);
    }

    fn write<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(AgentError::from)
            .and_then(|json| self.store.set(key, &json));

        match result {
            Ok(()) => debug!(key, "saved record"),
            Err(e) => error!(key, error = %e, "failed to save record"),
        }
    }

    fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!(key, error = %e, "failed to read record");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                error!(key, error = %e, "discarding malformed record");
                None
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            error!(key, error = %e, "failed to clear record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_transcript() -> Vec<Message> {
        let start = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        vec![
            Message {
                timestamp: start,
                ..Message::model("Olá, eu sou o Agente Cirúrgico.")
            },
            Message {
                timestamp: start + Duration::milliseconds(1_500),
                ..Message::user("Eu vou abordar o cliente.")
            },
            Message {
                timestamp: start + Duration::seconds(4),
                ..Message::model("Qual é a sua profissão?")
            },
        ]
    }

    #[test]
    fn test_user_round_trip() {
        let storage = Storage::in_memory();
        let user = UserState::authenticated("Ana").unwrap();
        storage.save_user(&user);
        assert_eq!(storage.load_user(), Some(user));
    }

    #[test]
    fn test_chat_round_trip_preserves_order_and_timestamps() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path());
        let messages = sample_transcript();

        storage.save_chat(&messages);
        let loaded = storage.load_chat().unwrap();

        assert_eq!(loaded, messages);
    }

    #[test]
    fn test_nothing_saved_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path().join("missing"));
        assert!(storage.load_user().is_none());
        assert!(storage.load_chat().is_none());
    }

    #[test]
    fn test_malformed_record_degrades_to_none() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(format!("{}.json", CHAT_KEY)), "[{not json").unwrap();
        let storage = Storage::open(dir.path());
        assert!(storage.load_chat().is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.remove(USER_KEY).is_ok());

        let storage = Storage::open(dir.path());
        storage.clear_user();
        storage.clear_chat();
        storage.save_user(&UserState::authenticated("Ana").unwrap());
        storage.clear_user();
        storage.clear_user();
        assert!(storage.load_user().is_none());
    }

    #[test]
    fn test_records_are_independent() {
        let storage = Storage::in_memory();
        storage.save_user(&UserState::authenticated("Ana").unwrap());
        storage.save_chat(&sample_transcript());
        storage.clear_user();
        assert!(storage.load_user().is_none());
        assert_eq!(storage.load_chat().map(|m| m.len()), Some(3));
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(matches!(store.set("../escape", "x"), Err(AgentError::Storage(_))));
    }
}
