mod config;
pub mod database;
mod settings;

pub use config::{AppsConfig, Config, EngineConfig, MonitorConfig};
pub use database::{Database, InterventionRecord};
pub use settings::{FocusSettings, SettingsStore};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::StoreError;

/// Returns the focusguard data directory.
///
/// `FOCUSGUARD_DATA_DIR` overrides the location entirely. Otherwise this is
/// `~/.config/focusguard[-dev]/` depending on `FOCUSGUARD_ENV`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let dir = match std::env::var_os("FOCUSGUARD_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env =
                std::env::var("FOCUSGUARD_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("focusguard-dev")
            } else {
                base_dir.join("focusguard")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| StoreError::DataDir(e.to_string()))?;
    Ok(dir)
}

/// String key-value preference storage.
///
/// Settings and blocklists are stored through this trait so they work the
/// same over SQLite and in memory.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Ok(Some(value)) => value.parse().unwrap_or(default),
            Ok(None) => default,
            Err(e) => {
                tracing::warn!("failed to read '{key}': {e}");
                default
            }
        }
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.set(key, if value { "true" } else { "false" })
    }
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// In-memory [`KvStore`], used by tests and short-lived simulations.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self
            .values
            .lock()
            .map_err(|_| StoreError::QueryFailed("memory store poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| StoreError::QueryFailed("memory store poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("missing").unwrap().is_none());
        store.set("key", "value").unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn bool_helpers_fall_back_on_garbage() {
        let store = MemoryStore::new();
        assert!(store.get_bool("flag", true));
        store.set("flag", "yes please").unwrap();
        assert!(!store.get_bool("flag", false));
        store.set_bool("flag", true).unwrap();
        assert!(store.get_bool("flag", false));
    }
}
