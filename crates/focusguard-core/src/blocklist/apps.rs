//! Blocked applications, plus app search and recency suggestions.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{load_json_list, save_json_list};
use crate::platform::{AppMetadata, AppRegistry, UsageStatsSource};
use crate::storage::{AppsConfig, KvStore};

const KEY_BLOCKED_APPS: &str = "blocked_apps";

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Apps worth suggesting even when the platform flags them as system apps.
pub const COMMON_DISTRACTING_APPS: &[&str] = &[
    "com.google.android.youtube",
    "com.facebook.katana",
    "com.instagram.android",
    "com.snapchat.android",
    "com.twitter.android",
    "com.zhiliaoapp.musically",
];

/// A blocked (or suggested) application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedApp {
    pub package_identifier: String,
    pub display_name: String,
    #[serde(default)]
    pub is_system_app: bool,
    #[serde(default)]
    pub last_used_timestamp: Option<i64>,
}

impl BlockedApp {
    fn from_metadata(meta: AppMetadata, last_used_timestamp: Option<i64>) -> Self {
        Self {
            package_identifier: meta.package_identifier,
            display_name: meta.display_name,
            is_system_app: meta.is_system_app,
            last_used_timestamp,
        }
    }

    /// Apps without a real label are services or background components.
    fn has_display_name(&self) -> bool {
        !self.display_name.trim().is_empty() && self.display_name != self.package_identifier
    }
}

/// User-curated list of blocked apps, keyed on package identifier.
pub struct AppBlocklist<S: KvStore> {
    store: S,
    limits: AppsConfig,
}

impl<S: KvStore> AppBlocklist<S> {
    pub fn new(store: S) -> Self {
        Self::with_limits(store, AppsConfig::default())
    }

    pub fn with_limits(store: S, limits: AppsConfig) -> Self {
        Self { store, limits }
    }

    pub fn list(&self) -> Vec<BlockedApp> {
        load_json_list(&self.store, KEY_BLOCKED_APPS, Vec::new)
    }

    pub fn contains(&self, package: &str) -> bool {
        self.list().iter().any(|app| app.package_identifier == package)
    }

    /// Block an installed app. The registry supplies its display name and
    /// system flag; when it cannot resolve the package nothing is stored.
    pub fn add(&self, package: &str, registry: &dyn AppRegistry) -> bool {
        let package = package.trim();
        if package.is_empty() {
            return false;
        }

        let mut apps = self.list();
        if apps.iter().any(|app| app.package_identifier == package) {
            return false;
        }

        let meta = match registry.resolve(package) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::debug!("cannot block {package}: {e}");
                return false;
            }
        };

        apps.push(BlockedApp::from_metadata(meta, None));
        save_json_list(&self.store, KEY_BLOCKED_APPS, &apps)
    }

    pub fn remove(&self, package: &str) -> bool {
        let mut apps = self.list();
        let before = apps.len();
        apps.retain(|app| app.package_identifier != package);
        if apps.len() == before {
            return false;
        }
        save_json_list(&self.store, KEY_BLOCKED_APPS, &apps)
    }

    /// Installed apps whose name or package contains `query`, excluding
    /// those already blocked. Sorted by name.
    pub fn search_apps(&self, query: &str, registry: &dyn AppRegistry) -> Vec<BlockedApp> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let blocked = self.blocked_packages();
        let mut results: Vec<BlockedApp> = registry
            .installed_packages()
            .into_iter()
            .filter(|package| !blocked.contains(package.as_str()))
            .filter_map(|package| registry.resolve(&package).ok())
            .map(|meta| BlockedApp::from_metadata(meta, None))
            .filter(|app| {
                app.display_name.to_lowercase().contains(&query)
                    || app.package_identifier.to_lowercase().contains(&query)
            })
            .collect();

        sort_by_name(&mut results);
        results.truncate(self.limits.search_limit);
        results
    }

    /// Apps used during the trailing window, most recent first, excluding
    /// blocked apps and background components.
    pub fn recently_used_apps(
        &self,
        now_ms: i64,
        usage: &dyn UsageStatsSource,
        registry: &dyn AppRegistry,
    ) -> Vec<BlockedApp> {
        let from_ms = now_ms - i64::from(self.limits.recent_window_days) * DAY_MS;

        // Daily buckets repeat packages; keep the latest use of each.
        let mut latest: HashMap<String, i64> = HashMap::new();
        for stat in usage.usage_stats(from_ms, now_ms) {
            let entry = latest.entry(stat.package).or_insert(stat.last_time_used_ms);
            *entry = (*entry).max(stat.last_time_used_ms);
        }

        let blocked = self.blocked_packages();
        let mut results: Vec<BlockedApp> = latest
            .into_iter()
            .filter(|(package, _)| !blocked.contains(package.as_str()))
            .filter_map(|(package, last_used)| {
                let meta = registry.resolve(&package).ok()?;
                Some(BlockedApp::from_metadata(meta, Some(last_used)))
            })
            .filter(is_user_facing)
            .filter(BlockedApp::has_display_name)
            .collect();

        results.sort_by(|a, b| {
            b.last_used_timestamp
                .cmp(&a.last_used_timestamp)
                .then_with(|| a.package_identifier.cmp(&b.package_identifier))
        });
        results.truncate(self.limits.recent_limit);
        results
    }

    /// Every resolvable, named app on the device, sorted by name.
    pub fn installed_apps(&self, registry: &dyn AppRegistry) -> Vec<BlockedApp> {
        let mut apps: Vec<BlockedApp> = registry
            .installed_packages()
            .into_iter()
            .filter_map(|package| registry.resolve(&package).ok())
            .map(|meta| BlockedApp::from_metadata(meta, None))
            .filter(BlockedApp::has_display_name)
            .collect();
        sort_by_name(&mut apps);
        apps
    }

    fn blocked_packages(&self) -> HashSet<String> {
        self.list()
            .into_iter()
            .map(|app| app.package_identifier)
            .collect()
    }
}

/// System apps are hidden from suggestions unless they are Google/Android
/// apps or well-known distractions.
fn is_user_facing(app: &BlockedApp) -> bool {
    !app.is_system_app
        || app.package_identifier.starts_with("com.google")
        || app.package_identifier.starts_with("com.android")
        || COMMON_DISTRACTING_APPS.contains(&app.package_identifier.as_str())
}

fn sort_by_name(apps: &mut [BlockedApp]) {
    apps.sort_by(|a, b| {
        a.display_name
            .cmp(&b.display_name)
            .then_with(|| a.package_identifier.cmp(&b.package_identifier))
    });
}
