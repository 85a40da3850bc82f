//! Platform collaborators.
//!
//! Everything the blocking engine needs from the operating system sits behind
//! the traits in this module: what is in the foreground, what the browser is
//! showing, which apps are installed and used, and how to push the user away
//! from a blocked page or app. Implementations live with the host; the core
//! only ships in-memory and file-backed ones.

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Kind of platform notification that produced a foreground signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// A new window (activity, dialog, page) took the foreground.
    WindowStateChanged,
    /// Content inside the current window changed.
    WindowContentChanged,
    /// The set of on-screen windows changed.
    WindowsChanged,
    /// Sampled by a poll loop rather than pushed.
    Poll,
}

/// What the browser is currently displaying.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BrowserView {
    /// Text of the URL bar (or omnibox), if it could be read.
    pub url: Option<String>,
    /// The user is typing in the URL bar.
    #[serde(default)]
    pub url_bar_focused: bool,
    /// Page content is present and no progress indicator is showing.
    #[serde(default)]
    pub page_loaded: bool,
}

/// One observation of the foreground, fed to the decision engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForegroundSignal {
    pub package: String,
    pub kind: SignalKind,
    #[serde(default)]
    pub browser: Option<BrowserView>,
}

impl ForegroundSignal {
    pub fn app(package: impl Into<String>, kind: SignalKind) -> Self {
        Self {
            package: package.into(),
            kind,
            browser: None,
        }
    }

    pub fn browser(package: impl Into<String>, kind: SignalKind, view: BrowserView) -> Self {
        Self {
            package: package.into(),
            kind,
            browser: Some(view),
        }
    }

    /// Sample the inspector. Returns `None` when nothing is in the foreground.
    pub fn capture(inspector: &dyn ForegroundInspector, kind: SignalKind) -> Option<Self> {
        let package = inspector.current_foreground_app()?;
        let url = inspector.current_displayed_url();
        let browser = url.is_some().then(|| BrowserView {
            url,
            url_bar_focused: inspector.is_url_bar_focused(),
            page_loaded: inspector.is_page_loaded(),
        });
        Some(Self {
            package,
            kind,
            browser,
        })
    }
}

/// Reads the current foreground state from the accessibility layer.
pub trait ForegroundInspector {
    fn current_foreground_app(&self) -> Option<String>;

    fn current_displayed_url(&self) -> Option<String>;

    fn is_url_bar_focused(&self) -> bool {
        false
    }

    fn is_page_loaded(&self) -> bool {
        true
    }
}

/// Performs corrective actions. All calls are fire-and-forget.
pub trait Actuator {
    fn navigate_back(&mut self);

    /// Try to close the foreground browser tab. Returns `false` when the
    /// close control could not be found; the caller falls back to
    /// [`Actuator::go_home`].
    fn attempt_close_foreground_tab(&mut self) -> bool;

    fn go_home(&mut self);

    fn show_blocking_screen(&mut self, entry: &str);

    /// Short transient notice to the user.
    fn notify(&mut self, _message: &str) {}
}

/// Usage event types reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageEventType {
    MoveToForeground,
    MoveToBackground,
    ActivityResumed,
    ActivityPaused,
    /// Any event type the monitors do not look at.
    #[serde(other)]
    Other,
}

/// A single usage event. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub package: String,
    pub event_type: UsageEventType,
    pub timestamp_ms: i64,
}

/// Aggregated usage for one package over a query range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStat {
    pub package: String,
    pub last_time_used_ms: i64,
}

/// Source of raw usage events, queried over `[from_ms, to_ms]`.
pub trait UsageEventSource {
    fn events(&self, from_ms: i64, to_ms: i64) -> Vec<UsageEvent>;
}

/// Source of aggregated usage statistics.
pub trait UsageStatsSource {
    fn usage_stats(&self, from_ms: i64, to_ms: i64) -> Vec<UsageStat>;
}

/// Metadata the registry knows about an installed app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppMetadata {
    pub package_identifier: String,
    pub display_name: String,
    #[serde(default)]
    pub is_system_app: bool,
}

/// Installed application lookup.
pub trait AppRegistry {
    fn resolve(&self, package: &str) -> Result<AppMetadata, RegistryError>;

    fn installed_packages(&self) -> Vec<String>;
}
