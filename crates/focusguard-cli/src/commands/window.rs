use chrono::Local;
use clap::Subcommand;
use focusguard_core::storage::Database;
use focusguard_core::SettingsStore;

#[derive(Subcommand)]
pub enum WindowAction {
    /// Show the focus window
    Show,
    /// Set the focus window (times as HH:MM; end before start wraps midnight)
    Set {
        start: String,
        end: String,
    },
    /// Forget the focus window; blocking stays idle until a new one is set
    Clear,
}

pub fn run(action: WindowAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let settings = SettingsStore::new(&db);

    match action {
        WindowAction::Show => {
            let window = settings.window();
            if !settings.is_window_set() {
                println!("{window} (not set)");
                return Ok(());
            }
            let now = Local::now().time();
            match (window.time_until_end(now), window.time_until_start(now)) {
                (Some(left), _) => println!("{window} (active, {} min left)", left.num_minutes()),
                (None, Some(wait)) => println!("{window} (starts in {} min)", wait.num_minutes()),
                (None, None) => println!("{window} (empty)"),
            }
        }
        WindowAction::Set { start, end } => {
            let window = settings.set_window(&start, &end)?;
            if window.start == window.end {
                eprintln!("warning: start equals end, the window is empty");
            }
            println!("focus window set: {window}");
        }
        WindowAction::Clear => {
            settings.save_window_set(false)?;
            println!("focus window cleared");
        }
    }
    Ok(())
}
