use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

mod commands;

#[derive(Parser)]
#[command(name = "focusguard", version, about = "Focusguard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Focus window management
    Window {
        #[command(subcommand)]
        action: commands::window::WindowAction,
    },
    /// Switch site or app blocking on and off
    Blocking {
        #[command(subcommand)]
        target: commands::blocking::BlockingTarget,
    },
    /// Blocked websites
    Sites {
        #[command(subcommand)]
        action: commands::sites::SitesAction,
    },
    /// Blocked apps
    Apps {
        #[command(subcommand)]
        action: commands::apps::AppsAction,
    },
    /// Print current blocking status as JSON
    Status,
    /// Replay a recorded signal trace through the blocking engine
    Simulate(commands::simulate::SimulateArgs),
    /// Run the focus service and browser watch against an app catalog
    Watch(commands::watch::WatchArgs),
    /// Intervention history
    History {
        /// Number of entries to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "focusguard=info,focusguard_core=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Window { action } => commands::window::run(action),
        Commands::Blocking { target } => commands::blocking::run(target),
        Commands::Sites { action } => commands::sites::run(action),
        Commands::Apps { action } => commands::apps::run(action),
        Commands::Status => commands::status::run(),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Watch(args) => commands::watch::run(args),
        Commands::History { limit } => commands::history::run(limit),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "focusguard", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
