//! Recommendation pipeline: match → rank → narrate
//!
//! Ties the matching engine, the ranker and the narrative boundary
//! together. The narrative backend is optional and allowed to fail; the
//! pipeline then falls back to a deterministic template so the buyer
//! always gets a complete recommendation.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ai::{Narrative, NarrativeBackend, NarrativeClient};
use crate::matching;
use crate::models::{BuyerProfile, Plan};
use crate::rank;

/// At most this many ranked candidates are handed to the narrative backend
pub const NARRATIVE_CANDIDATE_LIMIT: usize = 10;

/// The templated fallback narrative covers the top candidates only
pub const FALLBACK_TOP: usize = 5;

/// A complete recommendation for one buyer profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// Ranked candidates for the enriched display
    pub candidates: Vec<Plan>,
    pub narrative: Narrative,
}

/// Orchestrates the recommendation pipeline
pub struct Recommender {
    ai: Option<NarrativeClient>,
}

impl Recommender {
    pub fn new(ai: Option<NarrativeClient>) -> Self {
        Self { ai }
    }

    /// Match, rank and narrate a buyer profile against the catalog
    ///
    /// Never fails: matching is total, and a narrative backend error is
    /// replaced by the templated fallback.
    pub async fn recommend(&self, catalog: &[Plan], profile: &BuyerProfile) -> Recommendation {
        let candidates =
            matching::find_candidates(catalog, profile.category, profile.target_asset_value);
        let ranked = rank::rank(candidates, NARRATIVE_CANDIDATE_LIMIT);

        let narrative = match &self.ai {
            Some(client) => match client.generate_narrative(profile, &ranked).await {
                Ok(narrative) => narrative,
                Err(e) => {
                    warn!(error = %e, backend = client.host(), "Narrative backend failed, using fallback");
                    fallback_narrative(profile, &ranked)
                }
            },
            None => fallback_narrative(profile, &ranked),
        };

        let mut candidates = ranked;
        candidates.truncate(rank::DISPLAY_CAP);
        Recommendation {
            candidates,
            narrative,
        }
    }
}

/// Deterministic templated narrative over the top ranked candidates
///
/// Used whenever no backend is configured or the configured one fails.
pub fn fallback_narrative(profile: &BuyerProfile, ranked: &[Plan]) -> Narrative {
    let top: Vec<&Plan> = ranked.iter().take(FALLBACK_TOP).collect();

    let summary = match top.first() {
        Some(best) => {
            let names: Vec<&str> = top.iter().map(|p| p.plan_name.as_str()).collect();
            format!(
                "Selecionamos {} planos de {} para um crédito de R$ {:.2}: {}. \
                 O plano {} lidera com parcela de R$ {:.2} em {} meses e taxa de {:.1}%.",
                top.len(),
                profile.category.label(),
                profile.target_asset_value,
                names.join(", "),
                best.plan_name,
                best.monthly_installment,
                best.term_months,
                best.admin_fee * 100.0
            )
        }
        None => format!(
            "Nenhum plano de {} disponível para comparação no momento.",
            profile.category.label()
        ),
    };

    Narrative {
        summary,
        profile_label: "Comprador estratégico".to_string(),
        model: "template".to_string(),
        generated_at: Utc::now(),
    }
}
