//! Recommendation handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;

use cota_core::models::{BuyerProfile, Category};
use cota_core::recommend::{Recommendation, Recommender};

use crate::{AppError, AppState};

/// Buyer profile as submitted by the wizard
#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub category: String,
    pub target_asset_value: f64,
    #[serde(default)]
    pub monthly_budget: Option<f64>,
    #[serde(default)]
    pub bid_capacity: Option<f64>,
    #[serde(default)]
    pub horizon_months: Option<u32>,
}

/// POST /api/recommendations - Ranked candidates plus narrative
///
/// Never returns an empty candidate list; a narrative backend failure is
/// absorbed with the templated fallback.
pub async fn create_recommendation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<Recommendation>, AppError> {
    let category = request
        .category
        .parse::<Category>()
        .map_err(|e| AppError::bad_request(&e))?;
    if request.target_asset_value <= 0.0 {
        return Err(AppError::bad_request("target_asset_value must be positive"));
    }

    let profile = BuyerProfile {
        category,
        target_asset_value: request.target_asset_value,
        monthly_budget: request.monthly_budget,
        bid_capacity: request.bid_capacity,
        horizon_months: request.horizon_months,
    };

    // Snapshot the catalog so the lock is not held across the AI call
    let catalog = state.catalog.lock().await.all();

    let recommender = Recommender::new(state.ai.clone());
    let recommendation = recommender.recommend(&catalog, &profile).await;

    Ok(Json(recommendation))
}
