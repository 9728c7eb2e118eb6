use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use club_registry::config::{AppConfig, DatabaseConfig};
use club_registry::database::{ensure_schema, DatabaseManager};

#[derive(Parser)]
#[command(name = "club-registry")]
#[command(about = "Club records over HTTP, with identity-provider login for writes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Bring the schema up to date and serve HTTP (default)")]
    Serve,

    #[command(about = "Bring the schema up to date and exit")]
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up PG* and AUTH0_* variables
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("club_registry=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let config = AppConfig::from_env().context("invalid configuration")?;
            tracing::info!("Starting club registry in {:?} mode", config.environment);
            club_registry::server::run(config).await
        }
        Command::Migrate => {
            let db = DatabaseManager::connect(&DatabaseConfig::from_env())?;
            ensure_schema(db.pool()).await.context("schema migration failed")?;
            db.close().await;
            Ok(())
        }
    }
}
