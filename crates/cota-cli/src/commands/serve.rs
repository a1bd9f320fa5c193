//! Web server command

use std::path::Path;

use anyhow::{Context, Result};
use cota_core::providers::fetch_base_catalog;
use cota_server::ServerConfig;

use super::core::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
) -> Result<()> {
    let db = open_db(db_path)?;

    println!("📡 Fetching provider catalogs...");
    let static_plans = fetch_base_catalog()
        .await
        .context("Failed to fetch provider catalogs")?;
    println!("   {} plans in the static base", static_plans.len());

    let config = ServerConfig {
        allowed_origins: std::env::var("COTA_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
    };

    let static_dir = static_dir.map(|dir| dir.to_string_lossy().into_owned());
    cota_server::serve(db, static_plans, host, port, static_dir.as_deref(), config).await
}
