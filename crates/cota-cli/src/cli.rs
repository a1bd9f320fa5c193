//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// cota - Find and compare consórcio purchase plans
#[derive(Parser)]
#[command(name = "cota")]
#[command(about = "Consórcio plan matcher and recommender", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (stores uploaded plans and ingest history)
    #[arg(long, default_value = "cota.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Match catalog plans against a category and target credit
    Match {
        /// Asset category: vehicle, real_estate, heavy_equipment
        #[arg(short, long)]
        category: String,

        /// Target credit amount
        #[arg(long)]
        value: f64,

        /// Maximum number of plans to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Generate a full recommendation with narrative
    ///
    /// Uses the narrative backend configured via OLLAMA_HOST; without one
    /// (or when it fails) the deterministic templated narrative is used.
    Recommend {
        /// Asset category: vehicle, real_estate, heavy_equipment
        #[arg(short, long)]
        category: String,

        /// Target credit amount
        #[arg(long)]
        value: f64,

        /// Monthly budget available for the installment
        #[arg(long)]
        budget: Option<f64>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Ingest a plan file into the session catalog
    Ingest {
        /// File to ingest (.json, .csv or .txt)
        #[arg(short, long)]
        file: PathBuf,

        /// Provider the records belong to (alvorada, horizonte, meridional)
        #[arg(short, long, default_value = "alvorada")]
        provider: String,
    },

    /// Clear the uploaded plan set
    Reset,

    /// Show catalog and ingest status
    Status,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}
