//! Integration tests for on-disk storage.
//!
//! Everything that reads `FOCUSGUARD_DATA_DIR` lives in a single test so the
//! environment is never mutated concurrently.

use chrono::{Duration, TimeZone, Utc};
use focusguard_core::storage::FocusSettings;
use focusguard_core::{
    Blocklists, CatalogRegistry, Category, Config, Database, FocusWindow, InterventionAction,
    KvStore, SettingsStore,
};

#[test]
fn data_dir_override_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("FOCUSGUARD_DATA_DIR", dir.path());

    // Config: missing file is written with defaults, then edits stick.
    let mut config = Config::load().unwrap();
    assert_eq!(config, Config::default());
    assert!(dir.path().join("config.toml").exists());
    config.set("engine.site_cooldown_ms", "4500").unwrap();
    assert_eq!(Config::load().unwrap().engine.site_cooldown_ms, 4500);

    std::fs::write(dir.path().join("config.toml"), "engine = 3").unwrap();
    assert!(Config::load().is_err());
    assert_eq!(Config::load_or_default(), Config::default());

    // Database: settings, blocklists and history survive a reopen.
    {
        let db = Database::open().unwrap();
        SettingsStore::new(&db)
            .save(&FocusSettings {
                window: FocusWindow::parse("13:00", "15:30").unwrap(),
                window_set: true,
                site_blocking_enabled: true,
                app_blocking_enabled: true,
            })
            .unwrap();

        let lists = Blocklists::new(&db);
        assert!(lists.sites.add("www.youtube.com"));
        let mut catalog = CatalogRegistry::default();
        catalog.insert("com.snapchat.android", "Snapchat", false);
        assert!(lists.apps.add("com.snapchat.android", &catalog));

        let at = Utc.with_ymd_and_hms(2024, 6, 1, 13, 5, 0).unwrap();
        db.record_intervention(at, Category::App, "com.snapchat.android", InterventionAction::GoHome)
            .unwrap();
    }

    assert!(dir.path().join("focusguard.db").exists());
    let db = Database::open().unwrap();
    let settings = SettingsStore::new(&db).load();
    assert!(settings.should_monitor());
    assert_eq!(settings.window.to_string(), "13:00 - 15:30");

    let lists = Blocklists::new(&db);
    assert_eq!(lists.sites.list().last().map(String::as_str), Some("youtube.com"));
    assert!(lists.apps.contains("com.snapchat.android"));

    let history = db.recent_interventions(5).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].entry, "com.snapchat.android");
    let since = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    assert_eq!(db.interventions_since(since).unwrap(), 1);
    assert_eq!(db.interventions_since(since + Duration::days(1)).unwrap(), 0);

    std::env::remove_var("FOCUSGUARD_DATA_DIR");
}

#[test]
fn corrupt_values_fall_back_to_defaults() {
    let db = Database::open_memory().unwrap();
    db.set("blocked_sites", "not json").unwrap();
    db.set("blocked_apps", "{}").unwrap();
    db.set("start_time", "25:99").unwrap();
    db.set("window_set", "maybe").unwrap();

    let lists = Blocklists::new(&db);
    assert_eq!(lists.sites.list(), vec!["reddit.com", "x.com", "twitter.com"]);
    assert!(lists.apps.list().is_empty());

    let settings = SettingsStore::new(&db).load();
    assert_eq!(settings.window, FocusWindow::default());
    assert!(!settings.window_set);
}
