//! File-backed app registry and usage source.
//!
//! Stands in for the platform package manager and usage-stats service when
//! running off-device. A catalog file looks like:
//!
//! ```json
//! {
//!   "apps": [
//!     { "packageIdentifier": "com.instagram.android", "displayName": "Instagram" }
//!   ],
//!   "usage": [
//!     { "package": "com.instagram.android", "last_time_used_ms": 1700000000000 }
//!   ],
//!   "events": []
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};
use crate::platform::{
    AppMetadata, AppRegistry, UsageEvent, UsageEventSource, UsageStat, UsageStatsSource,
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    apps: Vec<AppMetadata>,
    #[serde(default)]
    usage: Vec<UsageStat>,
    #[serde(default)]
    events: Vec<UsageEvent>,
}

/// In-memory catalog of installed apps and their usage.
#[derive(Debug, Clone, Default)]
pub struct CatalogRegistry {
    apps: BTreeMap<String, AppMetadata>,
    usage: Vec<UsageStat>,
    events: Vec<UsageEvent>,
}

impl CatalogRegistry {
    /// Read a catalog from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid catalog.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a catalog from JSON text.
    ///
    /// # Errors
    /// Returns an error if the text is not a valid catalog.
    pub fn from_json(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(content)?;
        let apps = file
            .apps
            .into_iter()
            .map(|meta| (meta.package_identifier.clone(), meta))
            .collect();
        Ok(Self {
            apps,
            usage: file.usage,
            events: file.events,
        })
    }

    pub fn insert(&mut self, package: &str, display_name: &str, is_system_app: bool) {
        self.apps.insert(
            package.to_string(),
            AppMetadata {
                package_identifier: package.to_string(),
                display_name: display_name.to_string(),
                is_system_app,
            },
        );
    }

    pub fn record_usage(&mut self, stat: UsageStat) {
        self.usage.push(stat);
    }

    pub fn record_event(&mut self, event: UsageEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

impl AppRegistry for CatalogRegistry {
    fn resolve(&self, package: &str) -> Result<AppMetadata, RegistryError> {
        self.apps
            .get(package)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(package.to_string()))
    }

    fn installed_packages(&self) -> Vec<String> {
        self.apps.keys().cloned().collect()
    }
}

impl UsageStatsSource for CatalogRegistry {
    fn usage_stats(&self, from_ms: i64, to_ms: i64) -> Vec<UsageStat> {
        self.usage
            .iter()
            .filter(|stat| (from_ms..=to_ms).contains(&stat.last_time_used_ms))
            .cloned()
            .collect()
    }
}

impl UsageEventSource for CatalogRegistry {
    fn events(&self, from_ms: i64, to_ms: i64) -> Vec<UsageEvent> {
        self.events
            .iter()
            .filter(|event| (from_ms..=to_ms).contains(&event.timestamp_ms))
            .cloned()
            .collect()
    }
}
