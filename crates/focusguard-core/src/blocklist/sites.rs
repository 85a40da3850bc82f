//! Blocked website domains.

use super::{load_json_list, save_json_list};
use crate::storage::KvStore;

const KEY_BLOCKED_SITES: &str = "blocked_sites";

/// Domains blocked before the user has edited the list.
pub const DEFAULT_BLOCKED_SITES: &[&str] = &["reddit.com", "x.com", "twitter.com"];

fn default_sites() -> Vec<String> {
    DEFAULT_BLOCKED_SITES.iter().map(|s| s.to_string()).collect()
}

/// Reduce user input to a bare host: trimmed, lowercase, without scheme,
/// leading `www.` or path. Blank input yields an empty string.
pub fn normalize_domain(raw: &str) -> String {
    let domain = raw.trim().to_lowercase();
    let domain = domain
        .strip_prefix("http://")
        .or_else(|| domain.strip_prefix("https://"))
        .unwrap_or(domain.as_str());
    let domain = domain.strip_prefix("www.").unwrap_or(domain);
    match domain.find('/') {
        Some(idx) => domain[..idx].to_string(),
        None => domain.to_string(),
    }
}

/// User-curated list of blocked domains, persisted as a JSON array.
pub struct SiteBlocklist<S: KvStore> {
    store: S,
}

impl<S: KvStore> SiteBlocklist<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Current list, in insertion order.
    pub fn list(&self) -> Vec<String> {
        load_json_list(&self.store, KEY_BLOCKED_SITES, default_sites)
    }

    pub fn normalize(&self, raw: &str) -> String {
        normalize_domain(raw)
    }

    /// Add a domain. Fails on blank input, duplicates and storage errors.
    pub fn add(&self, raw: &str) -> bool {
        let domain = normalize_domain(raw);
        if domain.is_empty() {
            return false;
        }

        let mut sites = self.list();
        if sites.contains(&domain) {
            return false;
        }

        sites.push(domain);
        save_json_list(&self.store, KEY_BLOCKED_SITES, &sites)
    }

    /// Remove an exact (already normalized) domain.
    pub fn remove(&self, domain: &str) -> bool {
        let mut sites = self.list();
        let before = sites.len();
        sites.retain(|s| s != domain);
        if sites.len() == before {
            return false;
        }
        save_json_list(&self.store, KEY_BLOCKED_SITES, &sites)
    }

    /// First blocked domain contained in `url`, compared case-insensitively.
    pub fn matching(&self, url: &str) -> Option<String> {
        match_site(&self.list(), url).map(str::to_string)
    }
}

/// First entry of `sites` that occurs in `url`.
pub fn match_site<'a>(sites: &'a [String], url: &str) -> Option<&'a str> {
    let url = url.to_lowercase();
    sites
        .iter()
        .find(|site| !site.is_empty() && url.contains(site.as_str()))
        .map(String::as_str)
}
