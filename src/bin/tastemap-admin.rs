use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tastemap::config::{Config, DatabaseBackend};
use tastemap::seed;
use tastemap::storage::{PostgresStorage, SqliteStorage, Storage};
use tastemap::VisitLedger;

#[derive(Parser)]
#[command(name = "tastemap-admin")]
#[command(about = "Tastemap reference data and maintenance CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upsert the country dataset (bundled unless --file is given)
    Seed {
        /// JSON file with rows of {name, iso3, cuisine_style, cuisine_description}
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Recompute visit statistics for every country
    Recount,
    /// List countries, optionally filtered by cuisine style
    Countries {
        #[arg(long)]
        cuisine: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let storage: Arc<dyn Storage> = match config.database.backend {
        DatabaseBackend::Sqlite => Arc::new(
            SqliteStorage::new(&config.database.url, config.database.max_connections).await?,
        ),
        DatabaseBackend::Postgres => Arc::new(
            PostgresStorage::new(&config.database.url, config.database.max_connections).await?,
        ),
    };

    // Ensure database is initialized
    storage.init().await?;

    match cli.command {
        Commands::Seed { file } => {
            let countries = match &file {
                Some(path) => seed::load_countries(path)?,
                None => seed::bundled_countries()?,
            };
            let count = seed::seed_countries(storage.as_ref(), &countries)
                .await
                .context("failed to seed countries")?;
            match file {
                Some(path) => println!("✓ Seeded {} countries from {}", count, path.display()),
                None => println!("✓ Seeded {} countries from the bundled dataset", count),
            }
        }
        Commands::Recount => {
            let ledger = VisitLedger::new(storage);
            let count = ledger.recount_all().await?;
            println!("✓ Recomputed statistics for {} countries", count);
        }
        Commands::Countries { cuisine } => {
            let countries = storage.list_countries(cuisine.as_deref()).await?;
            if countries.is_empty() {
                println!("No countries found.");
            } else {
                println!("{:<6} {:<40} {}", "Code", "Name", "Cuisine");
                println!("{}", "-".repeat(80));
                for country in countries {
                    println!(
                        "{:<6} {:<40} {}",
                        country.country_code, country.name, country.cuisine_style
                    );
                }
            }
        }
    }

    Ok(())
}
