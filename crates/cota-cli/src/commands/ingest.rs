//! Ingest command: load a plan file into the session catalog

use std::path::Path;

use anyhow::{Context, Result};
use cota_core::catalog::CatalogStore;
use cota_core::ingest::ingest_file;
use cota_core::models::{IngestLogLevel, Provider};

use super::core::open_db;

pub async fn cmd_ingest(db_path: &Path, file: &Path, provider: &str) -> Result<()> {
    let provider = provider
        .parse::<Provider>()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Use alvorada, horizonte or meridional")?;

    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let db = open_db(db_path)?;
    // The ingest only touches the uploaded set; the static base is not
    // needed to merge and persist it
    let mut store = CatalogStore::new(vec![], Box::new(db.clone()));

    let report = ingest_file(&mut store, &filename, &contents, provider);
    db.record_ingest(
        &report.filename,
        report.format,
        report.ingested as i64,
        report.skipped as i64,
    )?;

    for entry in &report.log {
        match entry.level {
            IngestLogLevel::Info => println!("   {}", entry.message),
            IngestLogLevel::Warn => println!("⚠️  {}", entry.message),
            IngestLogLevel::Error => println!("❌ {}", entry.message),
        }
    }

    if report.ingested > 0 {
        println!(
            "✅ {} plano(s) ingeridos de {} (total enviado: {})",
            report.ingested,
            report.filename,
            store.uploaded_count()
        );
    } else {
        println!("⚠️  Nenhum plano ingerido de {}", report.filename);
    }

    Ok(())
}
