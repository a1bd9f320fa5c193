//! Tiered plan matching engine
//!
//! Given a target category and asset value, the engine widens its search
//! progressively until something is found: an exact value band, a relaxed
//! band, the nearest plans in the category, and finally a synthesized
//! placeholder plan. The search is total — it never fails and never
//! returns an empty list. Showing a buyer a dead end is not an option.

use tracing::debug;

use crate::models::{Category, Plan, Provider};
use crate::normalize::synthesize_stats;

/// Exact tier band: asset value within ±20% of the target
pub const EXACT_BAND: f64 = 0.2;

/// Relaxed tier band: asset value within ±50% of the target
pub const RELAXED_BAND: f64 = 0.5;

/// The exact tier stands when it finds at least this many plans
pub const EXACT_MIN_RESULTS: usize = 3;

/// How many nearest-by-value plans the category-only tier keeps
pub const NEAREST_LIMIT: usize = 10;

/// Ceiling on candidates handed to the ranker
pub const CANDIDATE_CAP: usize = 20;

/// Search the catalog for plans matching `(category, target_value)`
///
/// Tier order, each attempted only when the previous one fell short:
/// exact band (stop at ≥ 3 results), relaxed band (replaces the exact
/// results), category-only nearest-N, and a single synthetic plan when
/// the catalog has nothing in the category at all. Non-positive targets
/// are passed through: the bands degenerate, upstream input validation
/// is the caller's concern.
pub fn find_candidates(catalog: &[Plan], category: Category, target_value: f64) -> Vec<Plan> {
    let exact = filter_band(catalog, category, target_value, EXACT_BAND);
    debug!(tier = "exact", count = exact.len(), "Match tier evaluated");

    let mut candidates = if exact.len() >= EXACT_MIN_RESULTS {
        exact
    } else {
        let relaxed = filter_band(catalog, category, target_value, RELAXED_BAND);
        debug!(tier = "relaxed", count = relaxed.len(), "Match tier evaluated");
        relaxed
    };

    if candidates.is_empty() {
        candidates = nearest_in_category(catalog, category, target_value);
        debug!(
            tier = "nearest",
            count = candidates.len(),
            "Match tier evaluated"
        );
    }

    if candidates.is_empty() {
        debug!(tier = "synthetic", %category, "Catalog empty for category");
        return vec![synthetic_plan(category, target_value)];
    }

    candidates.truncate(CANDIDATE_CAP);
    candidates
}

fn filter_band(catalog: &[Plan], category: Category, target: f64, band: f64) -> Vec<Plan> {
    let lower = target * (1.0 - band);
    let upper = target * (1.0 + band);
    catalog
        .iter()
        .filter(|plan| {
            plan.category == category && plan.asset_value >= lower && plan.asset_value <= upper
        })
        .cloned()
        .collect()
}

/// All plans of the category, nearest to the target value first
fn nearest_in_category(catalog: &[Plan], category: Category, target: f64) -> Vec<Plan> {
    let mut plans: Vec<Plan> = catalog
        .iter()
        .filter(|plan| plan.category == category)
        .cloned()
        .collect();
    plans.sort_by(|a, b| {
        (a.asset_value - target)
            .abs()
            .total_cmp(&(b.asset_value - target).abs())
    });
    plans.truncate(NEAREST_LIMIT);
    plans
}

/// Placeholder plan for a category the catalog knows nothing about
///
/// RealEstate groups run long terms and high fees; everything else gets
/// the standard profile. The installment covers credit plus fee spread
/// over the term.
pub fn synthetic_plan(category: Category, target_value: f64) -> Plan {
    let (admin_fee, term_months) = match category {
        Category::RealEstate => (0.22, 180),
        _ => (0.15, 80),
    };
    let monthly_installment = target_value * (1.0 + admin_fee) / term_months as f64;

    Plan {
        provider: Provider::Alvorada,
        plan_name: format!("Plano Referência {}", category.label()),
        category,
        asset_value: target_value,
        term_months,
        monthly_installment,
        admin_fee,
        stats: Some(synthesize_stats(false)),
        features: vec![
            "Grupo em formação".to_string(),
            "Parcela estimada".to_string(),
        ],
    }
}
