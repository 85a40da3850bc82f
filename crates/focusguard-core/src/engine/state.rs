use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Where a blocking category currently sits in its state machine.
///
/// ```text
/// Idle -> Watching -> FirstIntervention -(hard action)-> Watching
/// ```
///
/// Escalation is not a resting phase: the hard action is issued and the
/// site returns to `Watching` within the same tick. `FirstIntervention`
/// only applies to sites. Apps go straight from a match back to `Watching`
/// once the soft action is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Outside the window, no window configured, or the feature is off.
    Idle,
    /// Enforcing, nothing flagged.
    Watching,
    /// A soft action was issued for a site; the next match of the same site
    /// escalates.
    FirstIntervention,
}

/// Transient blocking state. Owned by a single [`super::DecisionEngine`];
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingState {
    pub in_focus_window: bool,
    pub site_blocking_enabled: bool,
    pub app_blocking_enabled: bool,
    pub last_site_action: Option<NaiveDateTime>,
    pub last_app_action: Option<NaiveDateTime>,
    pub escalation_flag: bool,
    pub last_detected_site: Option<String>,
}

impl BlockingState {
    /// Forget cooldowns and escalation, keeping the feature switches.
    pub(super) fn clear_transient(&mut self) {
        self.last_site_action = None;
        self.last_app_action = None;
        self.clear_escalation();
    }

    pub(super) fn clear_escalation(&mut self) {
        self.escalation_flag = false;
        self.last_detected_site = None;
    }

    pub fn site_phase(&self) -> Phase {
        if !self.in_focus_window || !self.site_blocking_enabled {
            Phase::Idle
        } else if self.escalation_flag {
            Phase::FirstIntervention
        } else {
            Phase::Watching
        }
    }

    pub fn app_phase(&self) -> Phase {
        if self.in_focus_window && self.app_blocking_enabled {
            Phase::Watching
        } else {
            Phase::Idle
        }
    }
}
