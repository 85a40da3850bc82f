use clap::Subcommand;
use focusguard_core::storage::Database;
use focusguard_core::SiteBlocklist;

#[derive(Subcommand)]
pub enum SitesAction {
    /// List blocked sites
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Block a site (scheme, "www." and path are stripped)
    Add { domain: String },
    /// Unblock a site
    Remove { domain: String },
}

pub fn run(action: SitesAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let sites = SiteBlocklist::new(&db);

    match action {
        SitesAction::List { json } => {
            let list = sites.list();
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                for site in list {
                    println!("{site}");
                }
            }
        }
        SitesAction::Add { domain } => {
            let normalized = sites.normalize(&domain);
            if !sites.add(&domain) {
                return Err(format!("could not block '{domain}': blank or already blocked").into());
            }
            println!("blocked {normalized}");
        }
        SitesAction::Remove { domain } => {
            let normalized = sites.normalize(&domain);
            if !sites.remove(&normalized) {
                return Err(format!("'{normalized}' is not blocked").into());
            }
            println!("unblocked {normalized}");
        }
    }
    Ok(())
}
