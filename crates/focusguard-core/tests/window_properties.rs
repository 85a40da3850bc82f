//! Property tests for focus window evaluation.

use chrono::{Duration, NaiveTime};
use focusguard_core::window::{format_time_of_day, parse_time_of_day};
use focusguard_core::{in_window, FocusWindow};
use proptest::prelude::*;

fn time_of_day() -> impl Strategy<Value = NaiveTime> {
    (0u32..86_400).prop_map(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap())
}

proptest! {
    #[test]
    fn start_is_inside_and_end_is_outside(start in time_of_day(), end in time_of_day()) {
        prop_assume!(start != end);
        prop_assert!(in_window(start, end, start));
        prop_assert!(!in_window(start, end, end));
    }

    #[test]
    fn overnight_window_is_complement_of_its_reverse(
        start in time_of_day(),
        end in time_of_day(),
        now in time_of_day(),
    ) {
        prop_assume!(start != end);
        prop_assert_eq!(in_window(start, end, now), !in_window(end, start, now));
    }

    #[test]
    fn evaluation_is_pure(start in time_of_day(), end in time_of_day(), now in time_of_day()) {
        let first = in_window(start, end, now);
        prop_assert_eq!(first, in_window(start, end, now));
        prop_assert_eq!(first, FocusWindow::new(start, end).contains(now));
    }

    #[test]
    fn equal_endpoints_are_never_in_window(at in time_of_day(), now in time_of_day()) {
        prop_assert!(!in_window(at, at, now));
    }

    #[test]
    fn time_until_end_stays_within_duration(
        start in time_of_day(),
        end in time_of_day(),
        now in time_of_day(),
    ) {
        let window = FocusWindow::new(start, end);
        match window.time_until_end(now) {
            Some(left) => {
                prop_assert!(left > Duration::zero());
                prop_assert!(left <= window.duration());
            }
            None => prop_assert!(!window.contains(now)),
        }
    }

    #[test]
    fn formatted_times_parse_back(time in time_of_day()) {
        prop_assert_eq!(parse_time_of_day(&format_time_of_day(time)).unwrap(), time);
    }
}

#[test]
fn overnight_examples() {
    let window = FocusWindow::parse("22:00", "06:00").unwrap();
    assert!(window.wraps_midnight());
    assert!(window.contains(NaiveTime::from_hms_opt(23, 30, 0).unwrap()));
    assert!(window.contains(NaiveTime::from_hms_opt(5, 59, 59).unwrap()));
    assert!(!window.contains(NaiveTime::from_hms_opt(6, 0, 0).unwrap()));
    assert!(!window.contains(NaiveTime::from_hms_opt(21, 59, 59).unwrap()));
    assert_eq!(window.duration(), Duration::hours(8));
}
