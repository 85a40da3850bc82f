//! Replay a recorded trace of foreground signals through the engine.
//!
//! A trace is JSON:
//!
//! ```json
//! {
//!   "window": { "start": "09:00", "end": "10:00" },
//!   "sites": ["reddit.com"],
//!   "steps": [
//!     { "at": "2024-05-06T09:00:00", "package": "com.android.chrome", "url": "reddit.com/r/rust" },
//!     { "at": "2024-05-06T09:00:04", "package": "com.android.chrome", "url": "reddit.com/r/rust" }
//!   ]
//! }
//! ```
//!
//! Anything the trace leaves out (window, switches, lists) comes from the
//! stored settings.

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime, Utc};
use clap::Args;
use focusguard_core::platform::BrowserView;
use focusguard_core::storage::{Database, FocusSettings};
use focusguard_core::{
    Actuator, BlockedApp, BlocklistSource, Blocklists, Config, DecisionEngine, FocusWindow,
    ForegroundSignal, SettingsStore, SignalKind, StaticBlocklists,
};
use serde::Deserialize;

#[derive(Args)]
pub struct SimulateArgs {
    /// Trace file (JSON)
    trace: PathBuf,
    /// Write issued interventions to the history
    #[arg(long)]
    record: bool,
}

#[derive(Deserialize)]
struct TraceWindow {
    start: String,
    end: String,
}

#[derive(Deserialize)]
struct Trace {
    #[serde(default)]
    window: Option<TraceWindow>,
    #[serde(default)]
    site_blocking: Option<bool>,
    #[serde(default)]
    app_blocking: Option<bool>,
    #[serde(default)]
    sites: Option<Vec<String>>,
    #[serde(default)]
    apps: Option<Vec<BlockedApp>>,
    /// Whether the browser exposes a tab close control.
    #[serde(default = "default_true")]
    tab_close_available: bool,
    steps: Vec<TraceStep>,
}

#[derive(Deserialize)]
struct TraceStep {
    at: NaiveDateTime,
    package: String,
    #[serde(default = "default_kind")]
    kind: SignalKind,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    editing: bool,
    #[serde(default = "default_true")]
    page_loaded: bool,
}

fn default_true() -> bool {
    true
}

fn default_kind() -> SignalKind {
    SignalKind::WindowStateChanged
}

impl TraceStep {
    fn signal(&self) -> ForegroundSignal {
        match &self.url {
            Some(url) => ForegroundSignal::browser(
                self.package.clone(),
                self.kind,
                BrowserView {
                    url: Some(url.clone()),
                    url_bar_focused: self.editing,
                    page_loaded: self.page_loaded,
                },
            ),
            None => ForegroundSignal::app(self.package.clone(), self.kind),
        }
    }
}

/// Prints what a real device would be told to do.
struct PrintingActuator {
    tab_close_available: bool,
}

impl Actuator for PrintingActuator {
    fn navigate_back(&mut self) {
        println!("  -> navigate back");
    }

    fn attempt_close_foreground_tab(&mut self) -> bool {
        if self.tab_close_available {
            println!("  -> close tab");
        } else {
            println!("  -> close tab (control not found)");
        }
        self.tab_close_available
    }

    fn go_home(&mut self) {
        println!("  -> go home");
    }

    fn show_blocking_screen(&mut self, entry: &str) {
        println!("  -> blocking screen for {entry}");
    }

    fn notify(&mut self, message: &str) {
        println!("  -> notice: {message}");
    }
}

fn to_utc(at: NaiveDateTime) -> chrono::DateTime<Utc> {
    at.and_local_timezone(Local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| at.and_utc())
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(&args.trace)
        .map_err(|e| format!("cannot read {}: {e}", args.trace.display()))?;
    let trace: Trace = serde_json::from_str(&content)?;

    let db = Database::open()?;
    let stored = SettingsStore::new(&db).load();
    let settings = match &trace.window {
        Some(window) => FocusSettings {
            window: FocusWindow::parse(&window.start, &window.end)?,
            window_set: true,
            site_blocking_enabled: trace.site_blocking.unwrap_or(true),
            app_blocking_enabled: trace.app_blocking.unwrap_or(true),
        },
        None => FocusSettings {
            site_blocking_enabled: trace.site_blocking.unwrap_or(stored.site_blocking_enabled),
            app_blocking_enabled: trace.app_blocking.unwrap_or(stored.app_blocking_enabled),
            ..stored
        },
    };

    let persisted = Blocklists::new(&db);
    let lists = StaticBlocklists {
        sites: trace.sites.clone().unwrap_or_else(|| persisted.blocked_sites()),
        apps: trace.apps.clone().unwrap_or_else(|| persisted.blocked_apps()),
    };

    let mut engine = DecisionEngine::new(Config::load_or_default().engine);
    engine.apply_settings(&settings);
    let mut actuator = PrintingActuator {
        tab_close_available: trace.tab_close_available,
    };

    let mut issued = 0usize;
    for step in &trace.steps {
        println!("{} {}", step.at, step.package);
        let events = engine.tick(step.at, &step.signal(), &lists, &mut actuator);
        for event in &events {
            println!("  {}", serde_json::to_string(event)?);
            if let Some((category, entry, action)) = event.intervention() {
                issued += 1;
                if args.record {
                    db.record_intervention(to_utc(event.at()), category, entry, action)?;
                }
            }
        }
    }

    println!("{issued} intervention(s) over {} step(s)", trace.steps.len());
    Ok(())
}
