//! Always-on focus service.
//!
//! Polls usage events on a fixed interval. While the focus window is open
//! and site blocking is on, a browser resume puts up the blocking screen.
//! Once the window closes (or monitoring is no longer wanted) the service
//! stops itself.

use std::ops::ControlFlow;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;

use crate::blocklist::BlocklistSource;
use crate::events::{Category, Event, InterventionAction, Tier};
use crate::monitor::{spawn_monitor, MonitorHandle, UsageProbe};
use crate::platform::{Actuator, UsageEventSource};
use crate::storage::{Config, FocusSettings};

/// Outcome of one service poll.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceStep {
    Continue(Vec<Event>),
    Stop(Event),
}

#[derive(Debug, Clone)]
pub struct FocusService {
    probe: UsageProbe,
    settings: FocusSettings,
}

impl FocusService {
    pub fn new(config: &Config, settings: FocusSettings) -> Self {
        Self {
            probe: UsageProbe::service(&config.engine.browser_package, &config.monitor),
            settings,
        }
    }

    pub fn settings(&self) -> &FocusSettings {
        &self.settings
    }

    pub fn check(
        &self,
        now: DateTime<Local>,
        usage: &dyn UsageEventSource,
        blocklists: &dyn BlocklistSource,
        actuator: &mut dyn Actuator,
    ) -> ServiceStep {
        let at = now.naive_local();

        if !self.settings.should_monitor() {
            return ServiceStep::Stop(Event::MonitorStopped {
                reason: "monitoring disabled".into(),
                at,
            });
        }
        let in_window = self
            .settings
            .active_window()
            .is_some_and(|w| w.contains(at.time()));
        if !in_window {
            return ServiceStep::Stop(Event::MonitorStopped {
                reason: "outside focus window".into(),
                at,
            });
        }

        if !self.settings.site_blocking_enabled
            || !self.probe.seen(usage, now.timestamp_millis())
        {
            return ServiceStep::Continue(Vec::new());
        }

        let mut events = vec![Event::BrowserForeground {
            package: self.probe.package.clone(),
            at,
        }];
        match blocklists.blocked_sites().into_iter().next() {
            Some(site) => {
                tracing::info!("browser resumed during focus time, blocking {site}");
                actuator.show_blocking_screen(&site);
                events.push(Event::InterventionIssued {
                    category: Category::Site,
                    entry: site,
                    action: InterventionAction::BlockingScreen,
                    tier: Tier::Soft,
                    at,
                });
            }
            None => tracing::debug!("browser resumed but no sites are blocked"),
        }
        ServiceStep::Continue(events)
    }
}

/// Run the service on its configured interval, forwarding events to `tx`.
/// The loop also ends once the receiver is dropped.
pub fn spawn_focus_service<U, B, A, C>(
    service: FocusService,
    config: &Config,
    usage: U,
    blocklists: B,
    mut actuator: A,
    clock: C,
    tx: mpsc::UnboundedSender<Event>,
) -> MonitorHandle
where
    U: UsageEventSource + Send + 'static,
    B: BlocklistSource + Send + 'static,
    A: Actuator + Send + 'static,
    C: Fn() -> DateTime<Local> + Send + 'static,
{
    spawn_monitor("focus-service", config.monitor.service_interval(), move || {
        match service.check(clock(), &usage, &blocklists, &mut actuator) {
            ServiceStep::Continue(events) => {
                for event in events {
                    if tx.send(event).is_err() {
                        return ControlFlow::Break("receiver dropped".into());
                    }
                }
                ControlFlow::Continue(())
            }
            ServiceStep::Stop(event) => {
                let reason = match &event {
                    Event::MonitorStopped { reason, .. } => reason.clone(),
                    _ => "stopped".to_string(),
                };
                if tx.send(event).is_err() {
                    tracing::debug!("nobody listening for the stop event");
                }
                ControlFlow::Break(reason)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocklist::StaticBlocklists;
    use crate::catalog::CatalogRegistry;
    use crate::platform::{UsageEvent, UsageEventType};
    use crate::window::FocusWindow;
    use chrono::TimeZone;

    #[derive(Default)]
    struct Screens(Vec<String>);

    impl Actuator for Screens {
        fn navigate_back(&mut self) {}

        fn attempt_close_foreground_tab(&mut self) -> bool {
            true
        }

        fn go_home(&mut self) {}

        fn show_blocking_screen(&mut self, entry: &str) {
            self.0.push(entry.to_string());
        }
    }

    fn settings() -> FocusSettings {
        FocusSettings {
            window: FocusWindow::default(),
            window_set: true,
            site_blocking_enabled: true,
            app_blocking_enabled: false,
        }
    }

    fn sites() -> StaticBlocklists {
        StaticBlocklists {
            sites: vec!["youtube.com".into(), "reddit.com".into()],
            apps: Vec::new(),
        }
    }

    fn resumed_at(now: DateTime<Local>) -> CatalogRegistry {
        let mut catalog = CatalogRegistry::default();
        catalog.record_event(UsageEvent {
            package: "com.android.chrome".into(),
            event_type: UsageEventType::ActivityResumed,
            timestamp_ms: now.timestamp_millis() - 4_000,
        });
        catalog
    }

    #[test]
    fn browser_resume_shows_first_blocked_site() {
        let now = Local.with_ymd_and_hms(2024, 5, 6, 9, 20, 0).single().unwrap();
        let service = FocusService::new(&Config::default(), settings());
        let mut screens = Screens::default();

        let step = service.check(now, &resumed_at(now), &sites(), &mut screens);
        let ServiceStep::Continue(events) = step else {
            panic!("service stopped");
        };
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::BrowserForeground { .. }));
        assert_eq!(
            events[1].intervention(),
            Some((Category::Site, "youtube.com", InterventionAction::BlockingScreen))
        );
        assert_eq!(screens.0, vec!["youtube.com"]);
    }

    #[test]
    fn quiet_poll_continues() {
        let now = Local.with_ymd_and_hms(2024, 5, 6, 9, 20, 0).single().unwrap();
        let service = FocusService::new(&Config::default(), settings());
        let mut screens = Screens::default();
        let step = service.check(now, &CatalogRegistry::default(), &sites(), &mut screens);
        assert_eq!(step, ServiceStep::Continue(Vec::new()));
        assert!(screens.0.is_empty());
    }

    #[test]
    fn stops_outside_window_or_when_disabled() {
        let late = Local.with_ymd_and_hms(2024, 5, 6, 10, 0, 0).single().unwrap();
        let service = FocusService::new(&Config::default(), settings());
        let mut screens = Screens::default();
        let step = service.check(late, &resumed_at(late), &sites(), &mut screens);
        assert!(matches!(
            step,
            ServiceStep::Stop(Event::MonitorStopped { ref reason, .. }) if reason == "outside focus window"
        ));

        let off = FocusService::new(
            &Config::default(),
            FocusSettings {
                site_blocking_enabled: false,
                ..settings()
            },
        );
        let now = Local.with_ymd_and_hms(2024, 5, 6, 9, 20, 0).single().unwrap();
        assert!(matches!(
            off.check(now, &resumed_at(now), &sites(), &mut screens),
            ServiceStep::Stop(_)
        ));
        assert!(screens.0.is_empty());
    }

    #[derive(Clone, Default)]
    struct SharedScreens(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

    impl Actuator for SharedScreens {
        fn navigate_back(&mut self) {}

        fn attempt_close_foreground_tab(&mut self) -> bool {
            true
        }

        fn go_home(&mut self) {}

        fn show_blocking_screen(&mut self, entry: &str) {
            self.0.lock().unwrap().push(entry.to_string());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_service_ends_when_receiver_is_dropped() {
        let now = Local.with_ymd_and_hms(2024, 5, 6, 9, 20, 0).single().unwrap();
        let screens = SharedScreens::default();
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut handle = spawn_focus_service(
            FocusService::new(&Config::default(), settings()),
            &Config::default(),
            resumed_at(now),
            sites(),
            screens.clone(),
            move || now,
            tx,
        );

        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        assert!(handle.is_finished());
        assert_eq!(*screens.0.lock().unwrap(), vec!["youtube.com"]);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_service_stops_itself_at_window_end() {
        let late = Local.with_ymd_and_hms(2024, 5, 6, 11, 0, 0).single().unwrap();
        let service = FocusService::new(&Config::default(), settings());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handle = spawn_focus_service(
            service,
            &Config::default(),
            CatalogRegistry::default(),
            sites(),
            Screens::default(),
            move || late,
            tx,
        );

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, Event::MonitorStopped { .. }));
        assert!(rx.recv().await.is_none());
        handle.stop().await;
        assert!(handle.is_finished());
    }
}
