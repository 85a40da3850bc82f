use clap::{Subcommand, ValueEnum};
use focusguard_core::storage::Database;
use focusguard_core::SettingsStore;

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn enabled(self) -> bool {
        matches!(self, Toggle::On)
    }
}

#[derive(Subcommand)]
pub enum BlockingTarget {
    /// Website blocking
    Sites { state: Toggle },
    /// App blocking
    Apps { state: Toggle },
}

pub fn run(target: BlockingTarget) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let settings = SettingsStore::new(&db);

    let (name, enabled) = match target {
        BlockingTarget::Sites { state } => {
            settings.save_blocking_enabled(state.enabled())?;
            ("site", state.enabled())
        }
        BlockingTarget::Apps { state } => {
            settings.save_app_blocking_enabled(state.enabled())?;
            ("app", state.enabled())
        }
    };

    println!("{name} blocking {}", if enabled { "enabled" } else { "disabled" });
    if enabled && !settings.is_window_set() {
        eprintln!("note: no focus window set yet, see `focusguard window set`");
    }
    Ok(())
}
