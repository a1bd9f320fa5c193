//! Health and status handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use cota_core::ai::NarrativeBackend;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub static_plans: usize,
    pub uploaded_plans: usize,
    pub narrative_backend: Option<NarrativeBackendInfo>,
}

#[derive(Serialize)]
pub struct NarrativeBackendInfo {
    pub host: String,
    pub model: String,
}

/// GET /api/health - Liveness plus catalog and backend status
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let catalog = state.catalog.lock().await;

    Json(HealthResponse {
        status: "ok",
        static_plans: catalog.static_count(),
        uploaded_plans: catalog.uploaded_count(),
        narrative_backend: state.ai.as_ref().map(|client| NarrativeBackendInfo {
            host: client.host().to_string(),
            model: client.model().to_string(),
        }),
    })
}
