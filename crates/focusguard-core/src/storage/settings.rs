//! Persisted focus settings.
//!
//! Stored as individual keys in a [`KvStore`]:
//! - `start_time` / `end_time`: ISO local time strings
//! - `window_set`: whether the user has confirmed a window
//! - `blocking_enabled`: site blocking
//! - `app_blocking_enabled`: app blocking
//!
//! Missing or malformed values fall back to the defaults (09:00 - 10:00,
//! everything off) and are never reported as errors.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::KvStore;
use crate::error::{Result, StoreError};
use crate::window::{format_time_of_day, parse_time_of_day, FocusWindow};

const KEY_START_TIME: &str = "start_time";
const KEY_END_TIME: &str = "end_time";
const KEY_WINDOW_SET: &str = "window_set";
const KEY_BLOCKING_ENABLED: &str = "blocking_enabled";
const KEY_APP_BLOCKING_ENABLED: &str = "app_blocking_enabled";

/// Snapshot of everything the blocking engine needs from settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FocusSettings {
    pub window: FocusWindow,
    pub window_set: bool,
    pub site_blocking_enabled: bool,
    pub app_blocking_enabled: bool,
}

impl FocusSettings {
    /// The window the engine should enforce, if the user has set one.
    pub fn active_window(&self) -> Option<FocusWindow> {
        self.window_set.then_some(self.window)
    }

    /// Monitoring runs only with a confirmed window and at least one
    /// blocking feature switched on.
    pub fn should_monitor(&self) -> bool {
        self.window_set && (self.site_blocking_enabled || self.app_blocking_enabled)
    }
}

/// Settings persistence over a key-value store.
pub struct SettingsStore<S: KvStore> {
    store: S,
}

impl<S: KvStore> SettingsStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn start_time(&self) -> NaiveTime {
        self.time_or(KEY_START_TIME, FocusWindow::default().start)
    }

    pub fn end_time(&self) -> NaiveTime {
        self.time_or(KEY_END_TIME, FocusWindow::default().end)
    }

    pub fn window(&self) -> FocusWindow {
        FocusWindow::new(self.start_time(), self.end_time())
    }

    pub fn is_window_set(&self) -> bool {
        self.store.get_bool(KEY_WINDOW_SET, false)
    }

    pub fn is_blocking_enabled(&self) -> bool {
        self.store.get_bool(KEY_BLOCKING_ENABLED, false)
    }

    pub fn is_app_blocking_enabled(&self) -> bool {
        self.store.get_bool(KEY_APP_BLOCKING_ENABLED, false)
    }

    pub fn save_start_time(&self, time: NaiveTime) -> Result<(), StoreError> {
        self.store.set(KEY_START_TIME, &format_time_of_day(time))
    }

    pub fn save_end_time(&self, time: NaiveTime) -> Result<(), StoreError> {
        self.store.set(KEY_END_TIME, &format_time_of_day(time))
    }

    /// Store a new window and mark it as set.
    pub fn save_window(&self, window: FocusWindow) -> Result<(), StoreError> {
        self.save_start_time(window.start)?;
        self.save_end_time(window.end)?;
        self.save_window_set(true)
    }

    /// Parse `start` and `end` as times of day and store them as the window.
    ///
    /// # Errors
    /// Returns a validation error for an unparsable time, leaving the stored
    /// window untouched, or a storage error if the write fails.
    pub fn set_window(&self, start: &str, end: &str) -> Result<FocusWindow> {
        let window = FocusWindow::parse(start, end)?;
        self.save_window(window)?;
        Ok(window)
    }

    pub fn save_window_set(&self, is_set: bool) -> Result<(), StoreError> {
        self.store.set_bool(KEY_WINDOW_SET, is_set)
    }

    pub fn save_blocking_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.store.set_bool(KEY_BLOCKING_ENABLED, enabled)
    }

    pub fn save_app_blocking_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.store.set_bool(KEY_APP_BLOCKING_ENABLED, enabled)
    }

    pub fn load(&self) -> FocusSettings {
        FocusSettings {
            window: self.window(),
            window_set: self.is_window_set(),
            site_blocking_enabled: self.is_blocking_enabled(),
            app_blocking_enabled: self.is_app_blocking_enabled(),
        }
    }

    pub fn save(&self, settings: &FocusSettings) -> Result<(), StoreError> {
        self.save_start_time(settings.window.start)?;
        self.save_end_time(settings.window.end)?;
        self.save_window_set(settings.window_set)?;
        self.save_blocking_enabled(settings.site_blocking_enabled)?;
        self.save_app_blocking_enabled(settings.app_blocking_enabled)
    }

    fn time_or(&self, key: &str, default: NaiveTime) -> NaiveTime {
        match self.store.get(key) {
            Ok(Some(raw)) => parse_time_of_day(&raw).unwrap_or_else(|e| {
                tracing::warn!("ignoring stored {key}: {e}");
                default
            }),
            Ok(None) => default,
            Err(e) => {
                tracing::warn!("failed to read {key}: {e}");
                default
            }
        }
    }
}
