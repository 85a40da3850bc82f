//! Daily focus window evaluation.
//!
//! A focus window is a pair of times of day. When `start <= end` it covers the
//! same-day interval `[start, end)`; when `start > end` it wraps past midnight
//! and covers `[start, 24:00) ∪ [00:00, end)`.

use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Whether `now` falls inside the window `[start, end)`, wrapping midnight
/// when `start > end`.
pub fn in_window(start: NaiveTime, end: NaiveTime, now: NaiveTime) -> bool {
    if start <= end {
        now >= start && now < end
    } else {
        now >= start || now < end
    }
}

/// The daily interval during which blocking is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for FocusWindow {
    /// 09:00 - 10:00
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl FocusWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse both ends from ISO local time strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            start: parse_time_of_day(start)?,
            end: parse_time_of_day(end)?,
        })
    }

    pub fn contains(&self, now: NaiveTime) -> bool {
        in_window(self.start, self.end, now)
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Length of the window. A window with `start == end` is empty.
    pub fn duration(&self) -> Duration {
        if self.wraps_midnight() {
            Duration::days(1) - (self.start - self.end)
        } else {
            self.end - self.start
        }
    }

    /// Time left until the window closes, or `None` when `now` is outside it.
    pub fn time_until_end(&self, now: NaiveTime) -> Option<Duration> {
        if !self.contains(now) {
            return None;
        }
        let left = self.end - now;
        if left < Duration::zero() {
            Some(left + Duration::days(1))
        } else {
            Some(left)
        }
    }

    /// Time until the window next opens, or `None` when `now` is inside it.
    pub fn time_until_start(&self, now: NaiveTime) -> Option<Duration> {
        if self.contains(now) || self.start == self.end {
            return None;
        }
        let wait = self.start - now;
        if wait < Duration::zero() {
            Some(wait + Duration::days(1))
        } else {
            Some(wait)
        }
    }
}

impl std::fmt::Display for FocusWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}",
            format_time_of_day(self.start),
            format_time_of_day(self.end)
        )
    }
}

/// Format a time of day the way ISO local time does: `HH:MM`, with seconds
/// and fractions only when they are non-zero.
pub fn format_time_of_day(time: NaiveTime) -> String {
    if time.nanosecond() != 0 {
        time.format("%H:%M:%S%.f").to_string()
    } else if time.second() != 0 {
        time.format("%H:%M:%S").to_string()
    } else {
        time.format("%H:%M").to_string()
    }
}

/// Parse `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff`.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, ValidationError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| ValidationError::InvalidTime(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn same_day_window_is_start_inclusive_end_exclusive() {
        assert!(in_window(t(9, 0), t(10, 0), t(9, 0)));
        assert!(in_window(t(9, 0), t(10, 0), t(9, 59)));
        assert!(!in_window(t(9, 0), t(10, 0), t(10, 0)));
        assert!(!in_window(t(9, 0), t(10, 0), t(8, 59)));
    }

    #[test]
    fn overnight_window_wraps_midnight() {
        assert!(in_window(t(22, 0), t(6, 0), t(23, 0)));
        assert!(in_window(t(22, 0), t(6, 0), t(5, 59)));
        assert!(in_window(t(22, 0), t(6, 0), t(0, 0)));
        assert!(!in_window(t(22, 0), t(6, 0), t(6, 0)));
        assert!(!in_window(t(22, 0), t(6, 0), t(12, 0)));
    }

    #[test]
    fn empty_window_never_matches() {
        assert!(!in_window(t(9, 0), t(9, 0), t(9, 0)));
        assert_eq!(FocusWindow::new(t(9, 0), t(9, 0)).duration(), Duration::zero());
    }

    #[test]
    fn default_window_is_nine_to_ten() {
        let window = FocusWindow::default();
        assert_eq!(window.start, t(9, 0));
        assert_eq!(window.end, t(10, 0));
        assert_eq!(window.to_string(), "09:00 - 10:00");
    }

    #[test]
    fn duration_handles_overnight() {
        assert_eq!(FocusWindow::new(t(22, 0), t(6, 0)).duration(), Duration::hours(8));
        assert_eq!(FocusWindow::new(t(9, 0), t(10, 30)).duration(), Duration::minutes(90));
    }

    #[test]
    fn time_until_end_and_start() {
        let window = FocusWindow::new(t(22, 0), t(6, 0));
        assert_eq!(window.time_until_end(t(23, 0)), Some(Duration::hours(7)));
        assert_eq!(window.time_until_end(t(5, 0)), Some(Duration::hours(1)));
        assert_eq!(window.time_until_end(t(12, 0)), None);
        assert_eq!(window.time_until_start(t(12, 0)), Some(Duration::hours(10)));
        assert_eq!(window.time_until_start(t(23, 0)), None);

        let morning = FocusWindow::default();
        assert_eq!(morning.time_until_start(t(11, 0)), Some(Duration::hours(22)));
    }

    #[test]
    fn iso_formatting_drops_zero_seconds() {
        assert_eq!(format_time_of_day(t(9, 5)), "09:05");
        assert_eq!(
            format_time_of_day(NaiveTime::from_hms_opt(9, 5, 30).unwrap()),
            "09:05:30"
        );
    }

    #[test]
    fn parses_iso_local_time_variants() {
        assert_eq!(parse_time_of_day("09:00").unwrap(), t(9, 0));
        assert_eq!(parse_time_of_day(" 22:30:00 ").unwrap(), t(22, 30));
        assert_eq!(
            parse_time_of_day("07:15:30.250").unwrap(),
            NaiveTime::from_hms_milli_opt(7, 15, 30, 250).unwrap()
        );
        assert!(parse_time_of_day("25:00").is_err());
        assert!(parse_time_of_day("nine").is_err());
    }
}
