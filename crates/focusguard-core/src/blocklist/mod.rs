//! User-curated blocklists for websites and apps.
//!
//! Both lists are stored as JSON arrays under a single key of a
//! [`KvStore`]. A missing key yields the seed list; unparseable content is
//! logged and treated the same way.

mod apps;
mod sites;

pub use apps::{AppBlocklist, BlockedApp, COMMON_DISTRACTING_APPS};
pub use sites::{match_site, normalize_domain, SiteBlocklist, DEFAULT_BLOCKED_SITES};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::storage::KvStore;

/// Read-only view of the blocklists, as consumed by the decision engine.
pub trait BlocklistSource {
    fn blocked_sites(&self) -> Vec<String>;

    fn blocked_apps(&self) -> Vec<BlockedApp>;
}

/// Both blocklists over one store.
pub struct Blocklists<S: KvStore> {
    pub sites: SiteBlocklist<S>,
    pub apps: AppBlocklist<S>,
}

impl<S: KvStore + Clone> Blocklists<S> {
    pub fn new(store: S) -> Self {
        Self {
            sites: SiteBlocklist::new(store.clone()),
            apps: AppBlocklist::new(store),
        }
    }
}

impl<S: KvStore> BlocklistSource for Blocklists<S> {
    fn blocked_sites(&self) -> Vec<String> {
        self.sites.list()
    }

    fn blocked_apps(&self) -> Vec<BlockedApp> {
        self.apps.list()
    }
}

/// Fixed lists, handy for replaying traces and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticBlocklists {
    pub sites: Vec<String>,
    pub apps: Vec<BlockedApp>,
}

impl BlocklistSource for StaticBlocklists {
    fn blocked_sites(&self) -> Vec<String> {
        self.sites.clone()
    }

    fn blocked_apps(&self) -> Vec<BlockedApp> {
        self.apps.clone()
    }
}

fn load_json_list<S, T>(store: &S, key: &str, default: impl FnOnce() -> Vec<T>) -> Vec<T>
where
    S: KvStore,
    T: DeserializeOwned,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return default(),
        Err(e) => {
            tracing::warn!("failed to read {key}: {e}");
            return default();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!("{key} is not valid JSON, using defaults: {e}");
        default()
    })
}

fn save_json_list<S, T>(store: &S, key: &str, items: &[T]) -> bool
where
    S: KvStore,
    T: Serialize,
{
    let json = match serde_json::to_string(items) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("failed to encode {key}: {e}");
            return false;
        }
    };
    match store.set(key, &json) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("failed to persist {key}: {e}");
            false
        }
    }
}
