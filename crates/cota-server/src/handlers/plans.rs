//! Catalog listing and plan matching handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use cota_core::matching::find_candidates;
use cota_core::models::{Category, Plan};
use cota_core::rank::{rank, COMPARISON_CAP};

use crate::{AppError, AppState, MAX_PAGE_LIMIT};

/// Query parameters for listing plans
#[derive(Debug, Deserialize)]
pub struct PlanQuery {
    /// Filter by category (vehicle, real_estate, heavy_equipment)
    pub category: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Serialize)]
pub struct PlanListResponse {
    pub plans: Vec<Plan>,
    pub total: usize,
    pub limit: i64,
    pub offset: i64,
}

/// GET /api/plans - List the merged catalog
pub async fn list_plans(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PlanQuery>,
) -> Result<Json<PlanListResponse>, AppError> {
    // Input validation: clamp pagination parameters
    let limit = params.limit.max(1).min(MAX_PAGE_LIMIT);
    let offset = params.offset.max(0);

    let category = params
        .category
        .as_deref()
        .map(|c| c.parse::<Category>())
        .transpose()
        .map_err(|e| AppError::bad_request(&e))?;

    let mut plans = state.catalog.lock().await.all();
    if let Some(category) = category {
        plans.retain(|plan| plan.category == category);
    }
    let total = plans.len();
    let plans: Vec<Plan> = plans
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();

    Ok(Json(PlanListResponse {
        plans,
        total,
        limit,
        offset,
    }))
}

/// Query parameters for matching
#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub category: String,
    /// Target credit amount
    pub value: f64,
    /// Result cap, clamped to the comparison ceiling
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct MatchResponse {
    pub category: Category,
    pub target_value: f64,
    pub plans: Vec<Plan>,
}

/// GET /api/plans/match - Tiered match plus cost-efficiency ranking
pub async fn match_plans(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MatchQuery>,
) -> Result<Json<MatchResponse>, AppError> {
    let category = params
        .category
        .parse::<Category>()
        .map_err(|e| AppError::bad_request(&e))?;
    if params.value <= 0.0 {
        return Err(AppError::bad_request("value must be positive"));
    }
    let limit = params.limit.unwrap_or(COMPARISON_CAP).clamp(1, COMPARISON_CAP);

    let catalog = state.catalog.lock().await.all();
    let plans = rank(find_candidates(&catalog, category, params.value), limit);

    Ok(Json(MatchResponse {
        category,
        target_value: params.value,
        plans,
    }))
}
