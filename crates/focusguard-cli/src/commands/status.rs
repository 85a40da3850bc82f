use chrono::{Local, Utc};
use focusguard_core::storage::Database;
use focusguard_core::{Blocklists, BlocklistSource, SettingsStore};
use serde_json::json;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let settings = SettingsStore::new(&db).load();
    let lists = Blocklists::new(&db);

    let now = Local::now();
    let window = settings.active_window();
    let in_window = window.is_some_and(|w| w.contains(now.time()));
    let minutes_left = window
        .and_then(|w| w.time_until_end(now.time()))
        .map(|d| d.num_minutes());

    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|dt| dt.and_local_timezone(Local).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let status = json!({
        "window": settings.window.to_string(),
        "window_set": settings.window_set,
        "site_blocking_enabled": settings.site_blocking_enabled,
        "app_blocking_enabled": settings.app_blocking_enabled,
        "monitoring": settings.should_monitor(),
        "in_focus_window": in_window,
        "minutes_left": minutes_left,
        "blocked_sites": lists.blocked_sites().len(),
        "blocked_apps": lists.blocked_apps().len(),
        "interventions_today": db.interventions_since(midnight)?,
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
