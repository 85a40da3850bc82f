use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Which blocklist an intervention came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Site,
    App,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Site => "site",
            Category::App => "app",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "site" => Some(Category::Site),
            "app" => Some(Category::App),
            _ => None,
        }
    }
}

/// Corrective action handed to the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionAction {
    NavigateBack,
    CloseTab,
    GoHome,
    BlockingScreen,
}

impl InterventionAction {
    pub fn as_str(self) -> &'static str {
        match self {
            InterventionAction::NavigateBack => "navigate_back",
            InterventionAction::CloseTab => "close_tab",
            InterventionAction::GoHome => "go_home",
            InterventionAction::BlockingScreen => "blocking_screen",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "navigate_back" => Some(InterventionAction::NavigateBack),
            "close_tab" => Some(InterventionAction::CloseTab),
            "go_home" => Some(InterventionAction::GoHome),
            "blocking_screen" => Some(InterventionAction::BlockingScreen),
            _ => None,
        }
    }
}

impl std::fmt::Display for InterventionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escalation tier of a site intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Soft,
    Hard,
}

/// Every state change of the engine or a monitor produces an Event.
/// Callers log them, print them or record them in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    FocusWindowEntered {
        at: NaiveDateTime,
    },
    FocusWindowExited {
        at: NaiveDateTime,
    },
    InterventionIssued {
        category: Category,
        entry: String,
        action: InterventionAction,
        tier: Tier,
        at: NaiveDateTime,
    },
    /// A flagged site is no longer in the foreground; escalation starts over.
    EscalationCleared {
        site: String,
        at: NaiveDateTime,
    },
    /// The usage probe saw the browser come to the foreground.
    BrowserForeground {
        package: String,
        at: NaiveDateTime,
    },
    MonitorStopped {
        reason: String,
        at: NaiveDateTime,
    },
}

impl Event {
    pub fn at(&self) -> NaiveDateTime {
        match self {
            Event::FocusWindowEntered { at }
            | Event::FocusWindowExited { at }
            | Event::InterventionIssued { at, .. }
            | Event::EscalationCleared { at, .. }
            | Event::BrowserForeground { at, .. }
            | Event::MonitorStopped { at, .. } => *at,
        }
    }

    /// The intervention carried by this event, if any.
    pub fn intervention(&self) -> Option<(Category, &str, InterventionAction)> {
        match self {
            Event::InterventionIssued {
                category,
                entry,
                action,
                ..
            } => Some((*category, entry.as_str(), *action)),
            _ => None,
        }
    }
}
