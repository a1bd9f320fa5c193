//! Upload ingestion: file contents → raw records → catalog store
//!
//! Dispatches on the filename extension, parses the payload into raw
//! records, and feeds them to the catalog store. Every step reports
//! through a structured log stream returned with the report — the
//! operator-facing progress display — and mirrors to `tracing`.
//! Ingestion never corrupts the catalog: zero parsed records is a no-op.

use serde_json::Value;
use tracing::{info, warn};

use crate::catalog::CatalogStore;
use crate::delimited;
use crate::models::{IngestLogEntry, IngestReport, Provider, UploadFormat};
use crate::normalize::RawRecord;

/// Parse an uploaded file into raw records, without touching the store
///
/// Unrecognized extensions and unparseable payloads yield zero records
/// plus warning log lines, never an error.
pub fn parse_upload(
    filename: &str,
    contents: &str,
) -> (Vec<RawRecord>, usize, Vec<IngestLogEntry>) {
    let mut log = Vec::new();

    let Some(format) = UploadFormat::from_filename(filename) else {
        warn!(filename, "Unrecognized upload extension, skipping");
        log.push(IngestLogEntry::warn(
            filename,
            "Extensão não reconhecida, arquivo ignorado (.json, .csv ou .txt)",
        ));
        return (vec![], 0, log);
    };

    log.push(IngestLogEntry::info(
        filename,
        format!("Lendo arquivo {} ({})", filename, format),
    ));

    let (records, skipped) = match format {
        UploadFormat::Json => parse_json(filename, contents, &mut log),
        UploadFormat::Csv | UploadFormat::Txt => {
            let (records, skipped) = delimited::parse_sheet(contents);
            if records.is_empty() {
                log.push(IngestLogEntry::warn(
                    filename,
                    "Nenhuma linha de dados reconhecida na planilha",
                ));
            } else {
                log.push(IngestLogEntry::info(
                    filename,
                    format!(
                        "{} linhas de dados reconhecidas, {} descartadas",
                        records.len(),
                        skipped
                    ),
                ));
            }
            (records, skipped)
        }
    };

    (records, skipped, log)
}

/// JSON uploads: a top-level array of records, or an object with a `rows`
/// array. Anything else yields zero records with a warning.
fn parse_json(
    filename: &str,
    contents: &str,
    log: &mut Vec<IngestLogEntry>,
) -> (Vec<RawRecord>, usize) {
    let value: Value = match serde_json::from_str(contents) {
        Ok(value) => value,
        Err(e) => {
            warn!(filename, error = %e, "JSON upload failed to parse");
            log.push(IngestLogEntry::warn(
                filename,
                format!("JSON inválido: {}", e),
            ));
            return (vec![], 0);
        }
    };

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("rows") {
            Some(Value::Array(items)) => items,
            _ => {
                log.push(IngestLogEntry::warn(
                    filename,
                    "Esperado um array de registros ou um objeto com campo 'rows'",
                ));
                return (vec![], 0);
            }
        },
        _ => {
            log.push(IngestLogEntry::warn(
                filename,
                "Esperado um array de registros ou um objeto com campo 'rows'",
            ));
            return (vec![], 0);
        }
    };

    let total = items.len();
    let records: Vec<RawRecord> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    let skipped = total - records.len();
    if skipped > 0 {
        log.push(IngestLogEntry::warn(
            filename,
            format!("{} entradas não são objetos e foram ignoradas", skipped),
        ));
    }
    log.push(IngestLogEntry::info(
        filename,
        format!("{} registros lidos", records.len()),
    ));
    (records, skipped)
}

/// Parse an upload and ingest it into the store
///
/// Always succeeds; the report carries counts and the full log stream.
/// A report with `format: None` means the file type was not recognized.
pub fn ingest_file(
    store: &mut CatalogStore,
    filename: &str,
    contents: &str,
    provider_hint: Provider,
) -> IngestReport {
    let format = UploadFormat::from_filename(filename);
    let (records, skipped, mut log) = parse_upload(filename, contents);

    let ingested = if records.is_empty() {
        0
    } else {
        store.ingest_upload(&records, provider_hint)
    };

    if ingested > 0 {
        info!(filename, ingested, "Upload ingested into catalog");
        log.push(IngestLogEntry::info(
            filename,
            format!(
                "{} planos adicionados ao catálogo ({} enviados no total)",
                ingested,
                store.uploaded_count()
            ),
        ));
    }

    IngestReport {
        filename: filename.to_string(),
        format,
        ingested,
        skipped,
        log,
    }
}
