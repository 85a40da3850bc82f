//! Poll loops that drive blocking from usage events.
//!
//! Two monitors exist:
//! - the always-on service ([`crate::service::FocusService`]), polling every
//!   5 seconds for the browser being resumed;
//! - the foreground browser watch ([`BrowserWatch`]), polling every second
//!   and reporting whether the browser just came to the foreground.
//!
//! Both run on [`spawn_monitor`]: a tokio interval loop whose tick closure
//! always runs to completion before a stop request is seen. Missed ticks
//! are skipped, never queued.

use std::ops::ControlFlow;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDateTime};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::blocklist::BlocklistSource;
use crate::engine::SharedEngine;
use crate::events::Event;
use crate::platform::{Actuator, ForegroundSignal, UsageEventSource, UsageEventType};
use crate::storage::MonitorConfig;
use crate::window::FocusWindow;

/// Looks back over recent usage events for one package and event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageProbe {
    pub package: String,
    pub event_type: UsageEventType,
    pub lookback: Duration,
}

impl UsageProbe {
    pub fn new(package: impl Into<String>, event_type: UsageEventType, lookback: Duration) -> Self {
        Self {
            package: package.into(),
            event_type,
            lookback,
        }
    }

    /// Probe used by the always-on service: the browser being resumed.
    pub fn service(browser_package: &str, config: &MonitorConfig) -> Self {
        Self::new(
            browser_package,
            UsageEventType::ActivityResumed,
            Duration::from_secs(config.service_lookback_secs),
        )
    }

    /// Probe used by the foreground watch: the browser moving to front.
    pub fn foreground(browser_package: &str, config: &MonitorConfig) -> Self {
        Self::new(
            browser_package,
            UsageEventType::MoveToForeground,
            Duration::from_secs(config.foreground_lookback_secs),
        )
    }

    /// Whether a matching event happened in `[now - lookback, now]`.
    pub fn seen(&self, source: &dyn UsageEventSource, now_ms: i64) -> bool {
        let lookback_ms = i64::try_from(self.lookback.as_millis()).unwrap_or(i64::MAX);
        let from_ms = now_ms.saturating_sub(lookback_ms);
        source
            .events(from_ms, now_ms)
            .iter()
            .any(|e| e.package == self.package && e.event_type == self.event_type)
    }
}

/// Reports per tick whether the browser was just brought to the front.
/// Always `false` outside the focus window.
#[derive(Debug, Clone)]
pub struct BrowserWatch {
    probe: UsageProbe,
    window: Option<FocusWindow>,
}

impl BrowserWatch {
    pub fn new(probe: UsageProbe, window: Option<FocusWindow>) -> Self {
        Self { probe, window }
    }

    pub fn check(&self, now: DateTime<Local>, source: &dyn UsageEventSource) -> bool {
        let in_window = self
            .window
            .is_some_and(|w| w.contains(now.naive_local().time()));
        in_window && self.probe.seen(source, now.timestamp_millis())
    }
}

/// Handle to a running poll loop.
pub struct MonitorHandle {
    name: &'static str,
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The loop has exited, on its own or after [`MonitorHandle::stop`].
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Ask the loop to stop and wait until it has. A tick in progress
    /// finishes first. Calling this more than once is fine.
    pub async fn stop(&mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("{} monitor ended abnormally: {e}", self.name);
            }
        }
    }
}

/// Run `tick` every `period` until it breaks or the handle is stopped.
///
/// The first tick fires immediately. Must be called within a tokio runtime.
pub fn spawn_monitor<F>(name: &'static str, period: Duration, mut tick: F) -> MonitorHandle
where
    F: FnMut() -> ControlFlow<String> + Send + 'static,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!("{name} monitor started, every {period:?}");

        loop {
            tokio::select! {
                biased;
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        tracing::info!("{name} monitor stopped");
                        break;
                    }
                }
                _ = interval.tick() => {
                    if let ControlFlow::Break(reason) = tick() {
                        tracing::info!("{name} monitor finished: {reason}");
                        break;
                    }
                }
            }
        }
    });

    MonitorHandle {
        name,
        stop_tx,
        task: Some(task),
    }
}

/// Start the foreground browser watch. Each tick sends `true` or `false`
/// to `tx`; the loop ends when the receiver is dropped.
pub fn spawn_browser_watch<U, C>(
    browser: BrowserWatch,
    config: &MonitorConfig,
    usage: U,
    clock: C,
    tx: mpsc::UnboundedSender<bool>,
) -> MonitorHandle
where
    U: UsageEventSource + Send + 'static,
    C: Fn() -> DateTime<Local> + Send + 'static,
{
    spawn_monitor("browser-watch", config.foreground_interval(), move || {
        let seen = browser.check(clock(), &usage);
        if tx.send(seen).is_err() {
            return ControlFlow::Break("receiver dropped".into());
        }
        ControlFlow::Continue(())
    })
}

/// Feed a pushed platform signal to a shared engine.
///
/// Serializes signals arriving from several threads. A poisoned lock is
/// recovered, since the engine state stays consistent between ticks.
pub fn dispatch(
    engine: &SharedEngine,
    now: NaiveDateTime,
    signal: &ForegroundSignal,
    blocklists: &dyn BlocklistSource,
    actuator: &mut dyn Actuator,
) -> Vec<Event> {
    let mut engine = match engine.lock() {
        Ok(engine) => engine,
        Err(poisoned) => {
            tracing::warn!("engine lock poisoned, recovering");
            poisoned.into_inner()
        }
    };
    engine.tick(now, signal, blocklists, actuator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocklist::StaticBlocklists;
    use crate::catalog::CatalogRegistry;
    use crate::engine::DecisionEngine;
    use crate::events::InterventionAction;
    use crate::platform::{BrowserView, SignalKind, UsageEvent};
    use crate::storage::EngineConfig;
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const CHROME: &str = "com.android.chrome";

    fn event(event_type: UsageEventType, timestamp_ms: i64) -> UsageEvent {
        UsageEvent {
            package: CHROME.into(),
            event_type,
            timestamp_ms,
        }
    }

    #[test]
    fn probe_matches_package_type_and_lookback() {
        let mut catalog = CatalogRegistry::default();
        catalog.record_event(event(UsageEventType::ActivityResumed, 5_000));
        catalog.record_event(event(UsageEventType::MoveToForeground, 14_500));

        let service = UsageProbe::service(CHROME, &MonitorConfig::default());
        assert!(service.seen(&catalog, 15_000));
        assert!(!service.seen(&catalog, 15_001));

        let foreground = UsageProbe::foreground(CHROME, &MonitorConfig::default());
        assert!(foreground.seen(&catalog, 15_000));
        assert!(!foreground.seen(&catalog, 16_000));

        let other = UsageProbe::new("org.mozilla.firefox", UsageEventType::MoveToForeground, Duration::from_secs(60));
        assert!(!other.seen(&catalog, 15_000));
    }

    #[test]
    fn browser_watch_is_false_outside_window() {
        let now = Local.with_ymd_and_hms(2024, 5, 6, 9, 30, 0).single().unwrap();
        let mut catalog = CatalogRegistry::default();
        catalog.record_event(event(UsageEventType::MoveToForeground, now.timestamp_millis()));

        let probe = UsageProbe::foreground(CHROME, &MonitorConfig::default());
        let window = FocusWindow::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        );
        assert!(BrowserWatch::new(probe.clone(), Some(window)).check(now, &catalog));
        assert!(!BrowserWatch::new(probe.clone(), None).check(now, &catalog));

        let evening = FocusWindow::new(
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        );
        assert!(!BrowserWatch::new(probe, Some(evening)).check(now, &catalog));
    }

    #[tokio::test(start_paused = true)]
    async fn monitor_ticks_until_stopped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let mut handle = spawn_monitor("test", Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        handle.stop().await;
        assert!(handle.is_finished());
        let after_stop = ticks.load(Ordering::SeqCst);
        assert!(after_stop >= 3, "only {after_stop} ticks");

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);

        // Second stop is a no-op.
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn monitor_ends_when_tick_breaks() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let mut handle = spawn_monitor("test", Duration::from_secs(1), move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 1 {
                ControlFlow::Break("done".into())
            } else {
                ControlFlow::Continue(())
            }
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
        handle.stop().await;
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn browser_watch_reports_each_tick() {
        let now = Local.with_ymd_and_hms(2024, 5, 6, 9, 30, 0).single().unwrap();
        let mut catalog = CatalogRegistry::default();
        catalog.record_event(event(UsageEventType::MoveToForeground, now.timestamp_millis()));

        let config = MonitorConfig::default();
        let watch = BrowserWatch::new(
            UsageProbe::foreground(CHROME, &config),
            Some(FocusWindow::default()),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handle = spawn_browser_watch(watch, &config, catalog, move || now, tx);

        assert_eq!(rx.recv().await, Some(true));
        assert_eq!(rx.recv().await, Some(true));
        handle.stop().await;
    }

    #[derive(Default)]
    struct Backs(usize);

    impl Actuator for Backs {
        fn navigate_back(&mut self) {
            self.0 += 1;
        }

        fn attempt_close_foreground_tab(&mut self) -> bool {
            true
        }

        fn go_home(&mut self) {}

        fn show_blocking_screen(&mut self, _entry: &str) {}
    }

    fn shared_engine() -> SharedEngine {
        let mut engine = DecisionEngine::new(EngineConfig::default());
        engine.configure(Some(FocusWindow::default()), true, false);
        engine.into_shared()
    }

    fn reddit() -> ForegroundSignal {
        ForegroundSignal::browser(
            CHROME,
            SignalKind::WindowContentChanged,
            BrowserView {
                url: Some("reddit.com/r/rust".into()),
                url_bar_focused: false,
                page_loaded: true,
            },
        )
    }

    fn lists() -> StaticBlocklists {
        StaticBlocklists {
            sites: vec!["reddit.com".into()],
            apps: Vec::new(),
        }
    }

    fn nine_fifteen() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap()
    }

    #[test]
    fn concurrent_signals_get_one_soft_action() {
        let engine = shared_engine();
        let lists = lists();
        let signal = reddit();
        let now = nine_fifteen();

        let results: Vec<(Vec<Event>, usize)> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        let mut actuator = Backs::default();
                        let events = dispatch(&engine, now, &signal, &lists, &mut actuator);
                        (events, actuator.0)
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        let navigations: usize = results.iter().map(|(_, backs)| backs).sum();
        let issued = results
            .iter()
            .flat_map(|(events, _)| events)
            .filter(|e| {
                matches!(
                    e.intervention(),
                    Some((_, _, InterventionAction::NavigateBack))
                )
            })
            .count();
        assert_eq!(navigations, 1);
        assert_eq!(issued, 1);
        assert!(engine.lock().unwrap().state().escalation_flag);
    }

    #[test]
    fn dispatch_recovers_a_poisoned_engine() {
        let engine = shared_engine();
        let holder = Arc::clone(&engine);
        let crashed = std::thread::spawn(move || {
            let _guard = holder.lock().unwrap();
            panic!("actuator thread crashed");
        })
        .join();
        assert!(crashed.is_err());
        assert!(engine.is_poisoned());

        let mut actuator = Backs::default();
        let events = dispatch(&engine, nine_fifteen(), &reddit(), &lists(), &mut actuator);
        assert_eq!(actuator.0, 1);
        assert!(events.iter().any(|e| matches!(
            e.intervention(),
            Some((_, _, InterventionAction::NavigateBack))
        )));
    }
}
