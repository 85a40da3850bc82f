use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Subcommand;
use focusguard_core::storage::{data_dir, Database};
use focusguard_core::{AppBlocklist, BlockedApp, CatalogRegistry, Config};

#[derive(Subcommand)]
pub enum AppsAction {
    /// List blocked apps
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Block an installed app by package identifier
    Add {
        package: String,
        /// App catalog file (defaults to <data_dir>/catalog.json)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Unblock an app
    Remove { package: String },
    /// Search installed apps by name or package
    Search {
        query: String,
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Recently used apps worth blocking
    Recent {
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// All installed apps
    Installed {
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

pub(crate) fn load_catalog(path: Option<PathBuf>) -> Result<CatalogRegistry, Box<dyn std::error::Error>> {
    let path = match path {
        Some(path) => path,
        None => data_dir()?.join("catalog.json"),
    };
    if !Path::new(&path).exists() {
        return Err(format!("no app catalog at {}", path.display()).into());
    }
    Ok(CatalogRegistry::load(&path)?)
}

fn print_apps(apps: &[BlockedApp], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(apps)?);
        return Ok(());
    }
    for app in apps {
        println!("{}\t{}", app.package_identifier, app.display_name);
    }
    Ok(())
}

pub fn run(action: AppsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let apps = AppBlocklist::with_limits(&db, config.apps);

    match action {
        AppsAction::List { json } => print_apps(&apps.list(), json)?,
        AppsAction::Add { package, catalog } => {
            let catalog = load_catalog(catalog)?;
            if !apps.add(&package, &catalog) {
                return Err(
                    format!("could not block '{package}': unknown, blank or already blocked").into(),
                );
            }
            println!("blocked {package}");
        }
        AppsAction::Remove { package } => {
            if !apps.remove(&package) {
                return Err(format!("'{package}' is not blocked").into());
            }
            println!("unblocked {package}");
        }
        AppsAction::Search { query, catalog } => {
            let catalog = load_catalog(catalog)?;
            print_apps(&apps.search_apps(&query, &catalog), false)?;
        }
        AppsAction::Recent { catalog } => {
            let catalog = load_catalog(catalog)?;
            let recent = apps.recently_used_apps(Utc::now().timestamp_millis(), &catalog, &catalog);
            print_apps(&recent, false)?;
        }
        AppsAction::Installed { catalog } => {
            let catalog = load_catalog(catalog)?;
            print_apps(&apps.installed_apps(&catalog), false)?;
        }
    }
    Ok(())
}
