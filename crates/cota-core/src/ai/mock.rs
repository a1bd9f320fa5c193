//! Mock narrative backend for testing
//!
//! Produces deterministic narratives from its inputs, no LLM server
//! required.

use async_trait::async_trait;
use chrono::Utc;

use crate::error::Result;
use crate::models::{BuyerProfile, Plan};

use super::types::Narrative;
use super::NarrativeBackend;

/// Mock narrative backend
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// When set, generate_narrative fails (for fallback-path tests)
    pub failing: bool,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            failing: false,
        }
    }

    /// Create a mock backend whose generation always fails
    pub fn failing() -> Self {
        Self {
            healthy: false,
            failing: true,
        }
    }
}

#[async_trait]
impl NarrativeBackend for MockBackend {
    async fn generate_narrative(
        &self,
        profile: &BuyerProfile,
        candidates: &[Plan],
    ) -> Result<Narrative> {
        if self.failing {
            return Err(crate::error::Error::InvalidData(
                "mock backend configured to fail".into(),
            ));
        }

        let summary = match candidates.first() {
            Some(best) => format!(
                "Encontramos {} planos de {} próximos de R$ {:.2}. O plano {} da {} \
                 tem a menor parcela relativa: R$ {:.2} por mês em {} meses.",
                candidates.len(),
                profile.category.label(),
                profile.target_asset_value,
                best.plan_name,
                best.provider,
                best.monthly_installment,
                best.term_months
            ),
            None => format!(
                "Nenhum plano de {} disponível no momento.",
                profile.category.label()
            ),
        };

        Ok(Narrative {
            summary,
            profile_label: profile_label(profile.target_asset_value).to_string(),
            model: "mock".to_string(),
            generated_at: Utc::now(),
        })
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

/// Deterministic profile label from the target credit band
fn profile_label(target_asset_value: f64) -> &'static str {
    if target_asset_value < 80_000.0 {
        "Primeira conquista"
    } else if target_asset_value < 250_000.0 {
        "Patrimônio em construção"
    } else {
        "Grande investidor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::synthetic_plan;
    use crate::models::Category;

    fn profile(value: f64) -> BuyerProfile {
        BuyerProfile {
            category: Category::Vehicle,
            target_asset_value: value,
            monthly_budget: None,
            bid_capacity: None,
            horizon_months: None,
        }
    }

    #[tokio::test]
    async fn test_mock_narrative_mentions_best_plan() {
        let mock = MockBackend::new();
        let plans = vec![synthetic_plan(Category::Vehicle, 50_000.0)];

        let narrative = mock.generate_narrative(&profile(50_000.0), &plans).await.unwrap();
        assert!(narrative.summary.contains("Plano Referência"));
        assert_eq!(narrative.profile_label, "Primeira conquista");
        assert_eq!(narrative.model, "mock");
    }

    #[tokio::test]
    async fn test_mock_profile_labels_by_band() {
        let mock = MockBackend::new();
        let plans = vec![synthetic_plan(Category::Vehicle, 50_000.0)];

        for (value, label) in [
            (50_000.0, "Primeira conquista"),
            (150_000.0, "Patrimônio em construção"),
            (400_000.0, "Grande investidor"),
        ] {
            let narrative = mock.generate_narrative(&profile(value), &plans).await.unwrap();
            assert_eq!(narrative.profile_label, label);
        }
    }

    #[tokio::test]
    async fn test_failing_mock_errors() {
        let mock = MockBackend::failing();
        let plans = vec![synthetic_plan(Category::Vehicle, 50_000.0)];
        assert!(mock.generate_narrative(&profile(50_000.0), &plans).await.is_err());
        assert!(!mock.health_check().await);
    }
}
