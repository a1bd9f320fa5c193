//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database
//! - `cmd_reset` - Clear the uploaded plan set
//! - `cmd_status` - Catalog and ingest status

use std::path::Path;

use anyhow::{Context, Result};
use cota_core::catalog::{CatalogStore, PlanPersistence};
use cota_core::db::Database;
use cota_core::models::Category;
use cota_core::providers::fetch_base_catalog;

pub fn open_db(db_path: &Path) -> Result<Database> {
    Database::new(&db_path.to_string_lossy()).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path)?;

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Match plans: cota match -c vehicle -v 60000");
    println!("  2. Ingest a sheet: cota ingest --file planos.csv");
    println!("  3. Start web UI: cota serve");

    Ok(())
}

pub fn cmd_reset(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;
    db.clear().context("Failed to clear uploaded plans")?;

    println!("🧹 Uploaded plan set cleared (static base is untouched)");
    Ok(())
}

pub async fn cmd_status(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;

    println!("📡 Fetching provider catalogs...");
    let base = fetch_base_catalog()
        .await
        .context("Failed to fetch provider catalogs")?;
    let store = CatalogStore::new(base, Box::new(db.clone()));

    println!();
    println!("📒 Catalog");
    println!("   Static base:  {} plans", store.static_count());
    println!("   Uploaded:     {} plans", store.uploaded_count());
    println!("   Merged total: {} plans", store.all().len());

    let all = store.all();
    for category in [
        Category::Vehicle,
        Category::RealEstate,
        Category::HeavyEquipment,
    ] {
        let count = all.iter().filter(|p| p.category == category).count();
        println!("   {:<12} {} plans", format!("{}:", category.label()), count);
    }

    let history = db.ingest_history(5)?;
    if !history.is_empty() {
        println!();
        println!("📥 Recent ingestions");
        for record in history {
            println!(
                "   {} {} ({} ingested, {} skipped) [{}]",
                record.created_at.format("%Y-%m-%d %H:%M"),
                record.filename,
                record.ingested,
                record.skipped,
                record
                    .format
                    .map(|f| f.as_str())
                    .unwrap_or("unrecognized"),
            );
        }
    }

    Ok(())
}
