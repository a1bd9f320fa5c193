//! Candidate ranking by cost efficiency
//!
//! Plans are ordered by the ratio of monthly installment to credit amount,
//! ascending: the cheapest relative monthly burden first. The cap is the
//! caller's: the recommendation view shows a short enriched list, the
//! comparison view a longer one.

use crate::models::Plan;

/// Cap used for the enriched recommendation display
pub const DISPLAY_CAP: usize = 7;

/// Cap used for the full comparison list
pub const COMPARISON_CAP: usize = 20;

/// Order candidates by ascending installment/credit ratio and truncate
///
/// Ties break on the composite plan key, so identical input always yields
/// identical output.
pub fn rank(mut candidates: Vec<Plan>, cap: usize) -> Vec<Plan> {
    candidates.sort_by(|a, b| {
        a.cost_ratio()
            .total_cmp(&b.cost_ratio())
            .then_with(|| a.dedup_key().cmp(&b.dedup_key()))
    });
    candidates.truncate(cap);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Provider};

    fn plan(name: &str, value: f64, installment: f64) -> Plan {
        Plan {
            provider: Provider::Alvorada,
            plan_name: name.to_string(),
            category: Category::Vehicle,
            asset_value: value,
            term_months: 80,
            monthly_installment: installment,
            admin_fee: 0.15,
            stats: None,
            features: vec![],
        }
    }

    #[test]
    fn test_rank_orders_by_ratio_ascending() {
        let candidates = vec![
            plan("Caro", 50_000.0, 900.0),   // 0.018
            plan("Barato", 50_000.0, 600.0), // 0.012
            plan("Médio", 60_000.0, 840.0),  // 0.014
        ];

        let ranked = rank(candidates, COMPARISON_CAP);
        let names: Vec<&str> = ranked.iter().map(|p| p.plan_name.as_str()).collect();
        assert_eq!(names, vec!["Barato", "Médio", "Caro"]);

        for pair in ranked.windows(2) {
            assert!(pair[0].cost_ratio() <= pair[1].cost_ratio());
        }
    }

    #[test]
    fn test_rank_truncates_to_cap() {
        let candidates: Vec<Plan> = (0..12)
            .map(|i| plan(&format!("P{}", i), 50_000.0, 600.0 + i as f64))
            .collect();

        assert_eq!(rank(candidates, DISPLAY_CAP).len(), DISPLAY_CAP);
    }

    #[test]
    fn test_rank_deterministic_on_equal_ratios() {
        let a = vec![
            plan("Z", 50_000.0, 700.0),
            plan("A", 50_000.0, 700.0),
            plan("M", 50_000.0, 700.0),
        ];
        let b = vec![
            plan("M", 50_000.0, 700.0),
            plan("Z", 50_000.0, 700.0),
            plan("A", 50_000.0, 700.0),
        ];

        let ranked_a: Vec<String> = rank(a, 10).into_iter().map(|p| p.plan_name).collect();
        let ranked_b: Vec<String> = rank(b, 10).into_iter().map(|p| p.plan_name).collect();
        assert_eq!(ranked_a, ranked_b);
    }

    #[test]
    fn test_degraded_zero_value_plans_sort_last() {
        let mut degraded = plan("Degradado", 0.0, 0.0);
        degraded.asset_value = 0.0;
        let candidates = vec![degraded, plan("OK", 50_000.0, 700.0)];

        let ranked = rank(candidates, 10);
        assert_eq!(ranked[0].plan_name, "OK");
    }
}
