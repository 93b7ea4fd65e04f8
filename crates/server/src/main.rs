use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::database::connection::DbConnection;

pub(crate) mod auth;
pub(crate) mod config;
pub(crate) mod database;
pub(crate) mod error;
pub(crate) mod models;
pub(crate) mod server;
pub(crate) mod views;

#[cfg(test)]
mod tests;

#[derive(Debug, Parser)]
#[command(version, about = "Resource wall web server")]
struct Cli {
    /// Path to the yaml config.
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the web app (default).
    Serve,
    /// Create tables and seed the default categories.
    InitSchema,
    /// Drop every table.
    DropSchema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_yaml_file(&cli.config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::run_all(&config).await?,
        Command::InitSchema => {
            DbConnection::connect(&config.database)
                .await?
                .init_schema()
                .await?;
            info!("schema initialized");
        }
        Command::DropSchema => {
            DbConnection::connect(&config.database)
                .await?
                .drop_schema()
                .await?;
            info!("schema dropped");
        }
    }

    Ok(())
}
