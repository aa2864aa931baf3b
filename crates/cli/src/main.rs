//! UEPhone CLI - Database migrations and catalogue management.
//!
//! # Usage
//!
//! ```bash
//! # Create the shop schema and the session table
//! uephone-cli migrate
//!
//! # Replace the catalogue from a JSON file
//! uephone-cli stock import stock.json
//!
//! # Upsert by id instead of replacing
//! uephone-cli stock import stock.json --keep-existing
//!
//! # Summarise the catalogue
//! uephone-cli stock list
//!
//! # Resolve offers whose timers were lost
//! uephone-cli offers sweep
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `OFFER_*` - Same offer settings as the server, read by `offers sweep`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "uephone-cli")]
#[command(author, version, about = "UEPhone storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        /// Directory holding the migration files
        #[arg(long, default_value = commands::migrate::DEFAULT_MIGRATIONS_DIR)]
        dir: PathBuf,
    },
    /// Manage the stock catalogue
    Stock {
        #[command(subcommand)]
        action: StockAction,
    },
    /// Maintain price offers
    Offers {
        #[command(subcommand)]
        action: OffersAction,
    },
}

#[derive(Subcommand)]
enum StockAction {
    /// Import stock items from a JSON array
    Import {
        /// Path to the JSON file
        file: PathBuf,

        /// Upsert by id instead of replacing the whole catalogue
        #[arg(long)]
        keep_existing: bool,
    },
    /// Summarise the catalogue
    List,
}

#[derive(Subcommand)]
enum OffersAction {
    /// Expire stale offers and resolve overdue ones
    Sweep,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Migrate { dir } => commands::migrate::run(&dir).await,
        Commands::Stock { action } => match action {
            StockAction::Import {
                file,
                keep_existing,
            } => commands::stock::import(&file, keep_existing).await,
            StockAction::List => commands::stock::list().await,
        },
        Commands::Offers { action } => match action {
            OffersAction::Sweep => commands::offers::sweep().await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_stock_import() {
        let cli = Cli::try_parse_from(["uephone-cli", "stock", "import", "s.json", "--keep-existing"])
            .ok();
        assert!(matches!(
            cli.map(|c| c.command),
            Some(Commands::Stock {
                action: StockAction::Import {
                    keep_existing: true,
                    ..
                }
            })
        ));
    }
}
