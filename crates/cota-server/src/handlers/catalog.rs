//! Catalog upload, reset and history handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::warn;

use cota_core::ingest::ingest_file;
use cota_core::models::{IngestRecord, IngestReport, Provider};

use crate::{AppError, AppState};

/// How many history rows the API returns
const HISTORY_LIMIT: i64 = 50;

/// POST /api/catalog/upload - Ingest an uploaded plan file
///
/// Multipart form: a `file` part (.json/.csv/.txt) plus an optional
/// `provider` text part naming the administrator the records belong to.
/// The catalog mutex is held across parse-and-merge, so overlapping
/// uploads cannot lose each other's records.
pub async fn upload_catalog(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<IngestReport>, AppError> {
    let mut filename: Option<String> = None;
    let mut contents: Option<String> = None;
    let mut provider = Provider::Alvorada;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Invalid multipart payload: {}", e)))?
    {
        match field.name() {
            Some("provider") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::bad_request(&format!("Invalid provider field: {}", e)))?;
                provider = value
                    .parse()
                    .map_err(|e: String| AppError::bad_request(&e))?;
            }
            _ => {
                filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(&format!("Invalid file field: {}", e)))?;
                contents = Some(String::from_utf8_lossy(&bytes).into_owned());
            }
        }
    }

    let filename = filename.ok_or_else(|| AppError::bad_request("Missing file part"))?;
    let contents = contents.ok_or_else(|| AppError::bad_request("Missing file contents"))?;

    let report = {
        let mut catalog = state.catalog.lock().await;
        ingest_file(&mut catalog, &filename, &contents, provider)
    };

    if let Err(e) = state.db.record_ingest(
        &report.filename,
        report.format,
        report.ingested as i64,
        report.skipped as i64,
    ) {
        warn!(error = %e, "Failed to record ingest history");
    }

    if report.format.is_none() {
        // Unrecognized extension: reject so the upload control can reset,
        // the store was not touched
        return Err(AppError::bad_request(
            "Unsupported file type (expected .json, .csv or .txt)",
        ));
    }

    Ok(Json(report))
}

#[derive(serde::Serialize)]
pub struct ResetResponse {
    pub status: &'static str,
    pub uploaded_plans: usize,
}

/// POST /api/catalog/reset - Clear the uploaded set
pub async fn reset_catalog(State(state): State<Arc<AppState>>) -> Json<ResetResponse> {
    let mut catalog = state.catalog.lock().await;
    catalog.reset();

    Json(ResetResponse {
        status: "ok",
        uploaded_plans: catalog.uploaded_count(),
    })
}

/// GET /api/catalog/history - Recent ingestions, newest first
pub async fn ingest_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<IngestRecord>>, AppError> {
    Ok(Json(state.db.ingest_history(HISTORY_LIMIT)?))
}
