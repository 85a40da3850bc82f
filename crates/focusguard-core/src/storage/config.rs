//! TOML-based application configuration.
//!
//! Tunables that are not user settings proper:
//! - Blocking engine cooldowns and the browser/own package identifiers
//! - Monitor poll intervals and usage-event lookbacks
//! - App search and recency limits
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::ConfigError;

/// Blocking engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_site_cooldown_ms")]
    pub site_cooldown_ms: u64,
    #[serde(default = "default_app_cooldown_ms")]
    pub app_cooldown_ms: u64,
    /// Browser whose URL bar is inspected. Exempt from app blocking.
    #[serde(default = "default_browser_package")]
    pub browser_package: String,
    /// Our own package; never app-blocked.
    #[serde(default = "default_own_package")]
    pub own_package: String,
}

/// Poll loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Always-on service poll interval.
    #[serde(default = "default_service_interval_secs")]
    pub service_interval_secs: u64,
    #[serde(default = "default_service_lookback_secs")]
    pub service_lookback_secs: u64,
    /// Foreground (UI-driven) watch poll interval.
    #[serde(default = "default_foreground_interval_secs")]
    pub foreground_interval_secs: u64,
    #[serde(default = "default_foreground_lookback_secs")]
    pub foreground_lookback_secs: u64,
}

/// App picker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppsConfig {
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub apps: AppsConfig,
}

// Default functions
fn default_site_cooldown_ms() -> u64 {
    3000
}
fn default_app_cooldown_ms() -> u64 {
    2000
}
fn default_browser_package() -> String {
    "com.android.chrome".into()
}
fn default_own_package() -> String {
    "com.example.focusguard".into()
}
fn default_service_interval_secs() -> u64 {
    5
}
fn default_service_lookback_secs() -> u64 {
    10
}
fn default_foreground_interval_secs() -> u64 {
    1
}
fn default_foreground_lookback_secs() -> u64 {
    1
}
fn default_search_limit() -> usize {
    50
}
fn default_recent_limit() -> usize {
    20
}
fn default_recent_window_days() -> u32 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            site_cooldown_ms: default_site_cooldown_ms(),
            app_cooldown_ms: default_app_cooldown_ms(),
            browser_package: default_browser_package(),
            own_package: default_own_package(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            service_interval_secs: default_service_interval_secs(),
            service_lookback_secs: default_service_lookback_secs(),
            foreground_interval_secs: default_foreground_interval_secs(),
            foreground_lookback_secs: default_foreground_lookback_secs(),
        }
    }
}

impl MonitorConfig {
    pub fn service_interval(&self) -> Duration {
        Duration::from_secs(self.service_interval_secs.max(1))
    }

    pub fn foreground_interval(&self) -> Duration {
        Duration::from_secs(self.foreground_interval_secs.max(1))
    }
}

impl Default for AppsConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            recent_limit: default_recent_limit(),
            recent_window_days: default_recent_window_days(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the defaults when no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed, or if the default config cannot be written to disk. An
    /// unreadable file is left untouched.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub(crate) fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| load_failed(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(load_failed(e.to_string())),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value has the wrong type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |e: serde_json::Error| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        };
        let mut json = serde_json::to_value(&*self).map_err(invalid)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(invalid)?;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails; the file on disk is
    /// not rewritten when it cannot be loaded.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("using default config: {e}");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[engine]\nsite_cooldown_ms = 500\n").unwrap();
        assert_eq!(parsed.engine.site_cooldown_ms, 500);
        assert_eq!(parsed.engine.app_cooldown_ms, 2000);
        assert_eq!(parsed.monitor.service_interval_secs, 5);
        assert_eq!(parsed.apps.search_limit, 50);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("engine.site_cooldown_ms").as_deref(), Some("3000"));
        assert_eq!(
            cfg.get("engine.browser_package").as_deref(),
            Some("com.android.chrome")
        );
        assert!(cfg.get("engine.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_nested_number_and_string() {
        let mut cfg = Config::default();
        cfg.apply("monitor.service_interval_secs", "15").unwrap();
        cfg.apply("engine.browser_package", "org.mozilla.firefox").unwrap();
        assert_eq!(cfg.monitor.service_interval_secs, 15);
        assert_eq!(cfg.engine.browser_package, "org.mozilla.firefox");
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        let result = cfg.apply("engine.nonexistent_key", "value");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        let result = cfg.apply("apps.recent_limit", "lots");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        assert_eq!(cfg.apps.recent_limit, 20);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        let written: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, cfg);
    }

    #[test]
    fn unreadable_file_is_reported_and_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let original = b"# caf\xe9\n[engine]\nsite_cooldown_ms = 500\n";
        std::fs::write(&path, original).unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(ConfigError::LoadFailed { .. })));
        assert_eq!(std::fs::read(&path).unwrap(), original);
    }

    #[test]
    fn directory_in_place_of_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::create_dir(&path).unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
        assert!(path.is_dir());
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.engine.site_cooldown_ms, 3000);
        assert_eq!(cfg.engine.app_cooldown_ms, 2000);
        assert_eq!(cfg.monitor.service_interval(), Duration::from_secs(5));
        assert_eq!(cfg.monitor.foreground_interval(), Duration::from_secs(1));
        assert_eq!(cfg.monitor.service_lookback_secs, 10);
        assert_eq!(cfg.apps.recent_limit, 20);
        assert_eq!(cfg.apps.recent_window_days, 30);
    }
}
