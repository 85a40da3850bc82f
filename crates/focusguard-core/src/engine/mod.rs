//! Blocking decision engine.
//!
//! The engine is a wall-clock-driven state machine with no internal thread:
//! hosts feed it foreground signals through [`DecisionEngine::tick`], either
//! from a poll loop or as accessibility events arrive, and it answers by
//! instructing an [`Actuator`].
//!
//! ## Sites
//!
//! A blocked site first gets a soft action (navigate back). If the same site
//! is still showing once the cooldown has passed, the engine escalates:
//! it tries to close the tab and goes home when that fails.
//!
//! ## Apps
//!
//! A blocked app is sent home on every window-state change, outside the
//! app cooldown. The browser and our own package are never app-blocked.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = DecisionEngine::new(config.engine.clone());
//! engine.apply_settings(&settings.load());
//! // For each signal:
//! let events = engine.tick(now, &signal, &blocklists, &mut actuator);
//! ```

mod state;

pub use state::{BlockingState, Phase};

use std::sync::{Arc, Mutex};

use chrono::{NaiveDateTime, TimeDelta};

use crate::blocklist::{match_site, BlocklistSource};
use crate::events::{Category, Event, InterventionAction, Tier};
use crate::platform::{Actuator, ForegroundSignal, SignalKind};
use crate::storage::{EngineConfig, FocusSettings};
use crate::window::FocusWindow;

/// Engine shared between a poll loop and pushed platform events.
pub type SharedEngine = Arc<Mutex<DecisionEngine>>;

/// Message shown alongside every intervention.
pub fn blocked_notice(entry: &str) -> String {
    format!("{entry} is blocked during focus time")
}

#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: EngineConfig,
    window: Option<FocusWindow>,
    state: BlockingState,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            window: None,
            state: BlockingState::default(),
        }
    }

    pub fn into_shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &BlockingState {
        &self.state
    }

    pub fn window(&self) -> Option<FocusWindow> {
        self.window
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Replace the enforced window and feature switches.
    ///
    /// Switching a feature off drops whatever that feature was tracking.
    pub fn configure(&mut self, window: Option<FocusWindow>, site_enabled: bool, app_enabled: bool) {
        if self.window != window {
            self.state.clear_transient();
        }
        if !site_enabled {
            self.state.last_site_action = None;
            self.state.clear_escalation();
        }
        if !app_enabled {
            self.state.last_app_action = None;
        }
        self.window = window;
        self.state.site_blocking_enabled = site_enabled;
        self.state.app_blocking_enabled = app_enabled;
    }

    pub fn apply_settings(&mut self, settings: &FocusSettings) {
        self.configure(
            settings.active_window(),
            settings.site_blocking_enabled,
            settings.app_blocking_enabled,
        );
    }

    // ── Evaluation ───────────────────────────────────────────────────

    /// Re-evaluate the focus window at `now`, emitting enter/exit events.
    /// With both features off the engine never counts as inside.
    /// Leaving the window resets all transient state.
    pub fn update_window(&mut self, now: NaiveDateTime) -> Vec<Event> {
        let enforcing = self.state.site_blocking_enabled || self.state.app_blocking_enabled;
        let inside = enforcing && self.window.is_some_and(|w| w.contains(now.time()));
        if inside == self.state.in_focus_window {
            return Vec::new();
        }

        self.state.in_focus_window = inside;
        if inside {
            tracing::info!("focus window entered at {}", now.time());
            vec![Event::FocusWindowEntered { at: now }]
        } else {
            tracing::info!("focus window exited at {}", now.time());
            self.state.clear_transient();
            vec![Event::FocusWindowExited { at: now }]
        }
    }

    /// Process one foreground signal.
    ///
    /// Issues at most one site action and one app action. Signals that
    /// arrive while the relevant cooldown is running are dropped.
    pub fn tick(
        &mut self,
        now: NaiveDateTime,
        signal: &ForegroundSignal,
        blocklists: &dyn BlocklistSource,
        actuator: &mut dyn Actuator,
    ) -> Vec<Event> {
        let mut events = self.update_window(now);
        if !self.state.in_focus_window {
            return events;
        }

        if self.state.site_blocking_enabled {
            self.evaluate_site(now, signal, blocklists, actuator, &mut events);
        }
        if self.state.app_blocking_enabled {
            self.evaluate_app(now, signal, blocklists, actuator, &mut events);
        }
        events
    }

    /// URL to check against the site blocklist, if the signal carries a
    /// settled browser page. URLs being typed or still loading are ignored.
    fn settled_url<'a>(&self, signal: &'a ForegroundSignal) -> Option<&'a str> {
        if signal.package != self.config.browser_package {
            return None;
        }
        let view = signal.browser.as_ref()?;
        if view.url_bar_focused {
            return None;
        }
        if !view.page_loaded && signal.kind != SignalKind::WindowStateChanged {
            return None;
        }
        view.url.as_deref()
    }

    fn evaluate_site(
        &mut self,
        now: NaiveDateTime,
        signal: &ForegroundSignal,
        blocklists: &dyn BlocklistSource,
        actuator: &mut dyn Actuator,
        events: &mut Vec<Event>,
    ) {
        let in_browser = signal.package == self.config.browser_package;
        let url = self.settled_url(signal);
        if in_browser && url.is_none() {
            // Nothing readable yet; keep whatever is flagged.
            return;
        }

        let sites = blocklists.blocked_sites();
        let matched = url.and_then(|url| match_site(&sites, url));

        let Some(site) = matched else {
            if let Some(site) = self.state.last_detected_site.take() {
                tracing::debug!("{site} no longer in foreground, clearing escalation");
                self.state.escalation_flag = false;
                events.push(Event::EscalationCleared { site, at: now });
            }
            return;
        };

        if cooling_down(self.state.last_site_action, now, self.config.site_cooldown_ms) {
            tracing::debug!("site cooldown active, dropping signal for {site}");
            return;
        }

        let escalate =
            self.state.escalation_flag && self.state.last_detected_site.as_deref() == Some(site);

        let (action, tier) = if escalate {
            let action = if actuator.attempt_close_foreground_tab() {
                InterventionAction::CloseTab
            } else {
                tracing::warn!("tab close control not found, going home instead");
                actuator.go_home();
                InterventionAction::GoHome
            };
            self.state.clear_escalation();
            (action, Tier::Hard)
        } else {
            actuator.navigate_back();
            self.state.escalation_flag = true;
            self.state.last_detected_site = Some(site.to_string());
            (InterventionAction::NavigateBack, Tier::Soft)
        };

        actuator.notify(&blocked_notice(site));
        self.state.last_site_action = Some(now);
        tracing::info!("blocked site {site}: {action}");
        events.push(Event::InterventionIssued {
            category: Category::Site,
            entry: site.to_string(),
            action,
            tier,
            at: now,
        });
    }

    fn evaluate_app(
        &mut self,
        now: NaiveDateTime,
        signal: &ForegroundSignal,
        blocklists: &dyn BlocklistSource,
        actuator: &mut dyn Actuator,
        events: &mut Vec<Event>,
    ) {
        if signal.kind != SignalKind::WindowStateChanged {
            return;
        }
        let package = signal.package.as_str();
        if package == self.config.browser_package || package == self.config.own_package {
            return;
        }

        let apps = blocklists.blocked_apps();
        let Some(app) = apps.iter().find(|app| app.package_identifier == package) else {
            return;
        };

        if cooling_down(self.state.last_app_action, now, self.config.app_cooldown_ms) {
            tracing::debug!("app cooldown active, dropping signal for {package}");
            return;
        }

        actuator.go_home();
        actuator.notify(&blocked_notice(&app.display_name));
        self.state.last_app_action = Some(now);
        tracing::info!("blocked app {package}");
        events.push(Event::InterventionIssued {
            category: Category::App,
            entry: package.to_string(),
            action: InterventionAction::GoHome,
            tier: Tier::Soft,
            at: now,
        });
    }
}

/// A cooldown runs from `last` for `cooldown_ms`. A clock that went
/// backwards ends it.
fn cooling_down(last: Option<NaiveDateTime>, now: NaiveDateTime, cooldown_ms: u64) -> bool {
    let Some(last) = last else {
        return false;
    };
    let elapsed = now - last;
    let cooldown = TimeDelta::milliseconds(i64::try_from(cooldown_ms).unwrap_or(i64::MAX));
    elapsed >= TimeDelta::zero() && elapsed < cooldown
}
