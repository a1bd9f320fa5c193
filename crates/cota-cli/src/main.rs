//! cota CLI - Consórcio plan matcher
//!
//! Usage:
//!   cota init                             Initialize database
//!   cota match -c vehicle -v 60000        Match and rank catalog plans
//!   cota ingest --file planos.csv         Ingest a plan sheet
//!   cota serve --port 3000                Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Match {
            category,
            value,
            limit,
            json,
        } => commands::cmd_match(&cli.db, &category, value, limit, json).await,
        Commands::Recommend {
            category,
            value,
            budget,
            json,
        } => commands::cmd_recommend(&cli.db, &category, value, budget, json).await,
        Commands::Ingest { file, provider } => {
            commands::cmd_ingest(&cli.db, &file, &provider).await
        }
        Commands::Reset => commands::cmd_reset(&cli.db),
        Commands::Status => commands::cmd_status(&cli.db).await,
        Commands::Serve {
            port,
            host,
            static_dir,
        } => commands::cmd_serve(&cli.db, &host, port, static_dir.as_deref()).await,
    }
}
