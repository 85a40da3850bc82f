//! # Focusguard Core Library
//!
//! This library provides the core logic for the Focusguard focus-window
//! blocker: during a daily time window, designated websites and apps are
//! pushed away whenever they reach the foreground.
//!
//! ## Architecture
//!
//! - **Window**: possibly-overnight time-of-day interval arithmetic
//! - **Blocklists**: site and app lists stored as JSON in a key-value store
//! - **Engine**: a wall-clock-driven state machine that requires the caller
//!   to feed it foreground signals through `tick()`
//! - **Monitors**: tokio poll loops driven by platform usage events
//! - **Storage**: SQLite key-value store and intervention history, TOML
//!   configuration
//! - **Platform**: traits for everything the operating system provides
//!
//! ## Key Components
//!
//! - [`DecisionEngine`]: blocking state machine
//! - [`FocusWindow`]: the daily enforcement window
//! - [`SiteBlocklist`] / [`AppBlocklist`]: user-curated blocklists
//! - [`Database`]: settings, blocklists and history persistence
//! - [`Config`]: application configuration management
//! - [`Actuator`]: trait for the corrective actions the engine issues

pub mod blocklist;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod events;
pub mod monitor;
pub mod platform;
pub mod service;
pub mod storage;
pub mod window;

pub use blocklist::{AppBlocklist, BlockedApp, BlocklistSource, Blocklists, SiteBlocklist, StaticBlocklists};
pub use catalog::CatalogRegistry;
pub use engine::{BlockingState, DecisionEngine, Phase, SharedEngine};
pub use error::{ConfigError, CoreError, RegistryError, StoreError, ValidationError};
pub use events::{Category, Event, InterventionAction, Tier};
pub use monitor::{BrowserWatch, MonitorHandle, UsageProbe};
pub use platform::{Actuator, AppRegistry, ForegroundInspector, ForegroundSignal, SignalKind};
pub use service::{FocusService, ServiceStep};
pub use storage::{Config, Database, FocusSettings, KvStore, MemoryStore, SettingsStore};
pub use window::{in_window, FocusWindow};
