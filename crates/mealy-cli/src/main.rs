use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;

#[derive(Parser)]
#[command(name = "mealy-cli", version, about = "Mealy CLI: shared household meal tracker")]
struct Cli {
    /// Use a local demo household instead of the remote store
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current period and who has eaten
    Status,
    /// Mark yourself as having eaten
    Eat,
    /// Toggle your away status
    Away,
    /// Report that the food is finished for this period
    Finished,
    /// Undo a food-finished report
    Undo,
    /// Run one period check now
    Reconcile,
    /// Keep polling and print events as JSON lines until Ctrl-C
    Watch,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// API token management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mealy_core=info,mealy_cli=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let offline = cli.offline;
    let result = match cli.command {
        Commands::Status => commands::status::run(offline).await,
        Commands::Eat => commands::member::eat(offline).await,
        Commands::Away => commands::member::away(offline).await,
        Commands::Finished => commands::food::finished(offline).await,
        Commands::Undo => commands::food::undo(offline).await,
        Commands::Reconcile => commands::reconcile::run(offline).await,
        Commands::Watch => commands::watch::run(offline).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Auth { action } => commands::auth::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
