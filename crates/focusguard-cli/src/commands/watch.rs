//! Run the always-on focus service and the foreground browser watch.
//!
//! Usage events come from the app catalog file, which is re-read on every
//! poll so another process can append to its `events` list.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, Utc};
use clap::Args;
use focusguard_core::monitor::spawn_browser_watch;
use focusguard_core::platform::{UsageEvent, UsageEventSource};
use focusguard_core::service::spawn_focus_service;
use focusguard_core::storage::{data_dir, Database};
use focusguard_core::{
    Actuator, BlocklistSource, Blocklists, BrowserWatch, CatalogRegistry, Config, Event,
    FocusService, SettingsStore, StaticBlocklists, UsageProbe,
};
use tokio::sync::mpsc;

#[derive(Args)]
pub struct WatchArgs {
    /// App catalog file (defaults to <data_dir>/catalog.json)
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Stop after this many seconds
    #[arg(long)]
    seconds: Option<u64>,
}

/// Catalog whose usage events are read fresh from disk on each query.
#[derive(Clone)]
struct LiveCatalog(PathBuf);

impl UsageEventSource for LiveCatalog {
    fn events(&self, from_ms: i64, to_ms: i64) -> Vec<UsageEvent> {
        match CatalogRegistry::load(&self.0) {
            Ok(catalog) => catalog.events(from_ms, to_ms),
            Err(e) => {
                tracing::warn!("cannot read {}: {e}", self.0.display());
                Vec::new()
            }
        }
    }
}

struct ScreenActuator;

impl Actuator for ScreenActuator {
    fn navigate_back(&mut self) {}

    fn attempt_close_foreground_tab(&mut self) -> bool {
        false
    }

    fn go_home(&mut self) {}

    fn show_blocking_screen(&mut self, entry: &str) {
        println!("{entry} is blocked during your focus time");
    }
}

pub fn run(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let settings = SettingsStore::new(&db).load();
    if !settings.should_monitor() {
        return Err("nothing to watch: set a focus window and enable blocking".into());
    }
    let config = Config::load_or_default();

    let path = match args.catalog {
        Some(path) => path,
        None => data_dir()?.join("catalog.json"),
    };
    let usage = LiveCatalog(path);

    let persisted = Blocklists::new(&db);
    let lists = StaticBlocklists {
        sites: persisted.blocked_sites(),
        apps: persisted.blocked_apps(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();

        let mut service = spawn_focus_service(
            FocusService::new(&config, settings),
            &config,
            usage.clone(),
            lists,
            ScreenActuator,
            Local::now,
            event_tx,
        );
        let mut browser = spawn_browser_watch(
            BrowserWatch::new(
                UsageProbe::foreground(&config.engine.browser_package, &config.monitor),
                settings.active_window(),
            ),
            &config.monitor,
            usage,
            Local::now,
            seen_tx,
        );

        let deadline = tokio::time::sleep(Duration::from_secs(args.seconds.unwrap_or(u64::MAX / 4)));
        tokio::pin!(deadline);

        let mut result: Result<(), Box<dyn std::error::Error>> = Ok(());
        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    let Some(event) = event else { break };
                    println!("{}", serde_json::to_string(&event)?);
                    if let Some((category, entry, action)) = event.intervention() {
                        if let Err(e) = db.record_intervention(Utc::now(), category, entry, action) {
                            result = Err(e.into());
                            break;
                        }
                    }
                    if matches!(event, Event::MonitorStopped { .. }) {
                        break;
                    }
                }
                Some(true) = seen_rx.recv() => {
                    tracing::info!("browser moved to the foreground");
                }
                _ = &mut deadline => break,
            }
        }

        service.stop().await;
        browser.stop().await;
        result
    })
}
