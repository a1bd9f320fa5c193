//! Match and recommendation commands

use std::path::Path;

use anyhow::{Context, Result};
use cota_core::ai::NarrativeClient;
use cota_core::catalog::CatalogStore;
use cota_core::matching::find_candidates;
use cota_core::models::{BuyerProfile, Category, Plan};
use cota_core::providers::fetch_base_catalog;
use cota_core::rank::rank;
use cota_core::recommend::Recommender;

use super::core::open_db;

/// Format an amount the way the catalog displays money
pub fn format_money(value: f64) -> String {
    format!("R$ {:.2}", value)
}

async fn load_catalog(db_path: &Path) -> Result<Vec<Plan>> {
    let db = open_db(db_path)?;
    let base = fetch_base_catalog()
        .await
        .context("Failed to fetch provider catalogs")?;
    Ok(CatalogStore::new(base, Box::new(db)).all())
}

fn parse_category(category: &str) -> Result<Category> {
    category
        .parse::<Category>()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Use vehicle, real_estate or heavy_equipment")
}

pub async fn cmd_match(
    db_path: &Path,
    category: &str,
    value: f64,
    limit: usize,
    json: bool,
) -> Result<()> {
    let category = parse_category(category)?;
    let catalog = load_catalog(db_path).await?;

    let ranked = rank(find_candidates(&catalog, category, value), limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
        return Ok(());
    }

    println!(
        "🔎 {} plano(s) de {} para um crédito de {}",
        ranked.len(),
        category.label(),
        format_money(value)
    );
    println!();
    println!(
        "{:<28} {:<12} {:>14} {:>6} {:>12} {:>7} {:>9}",
        "Plano", "Admin.", "Crédito", "Prazo", "Parcela", "Taxa", "Parc./Cr."
    );
    for plan in &ranked {
        println!(
            "{:<28} {:<12} {:>14} {:>6} {:>12} {:>6.1}% {:>9.4}",
            plan.plan_name,
            plan.provider.to_string(),
            format_money(plan.asset_value),
            plan.term_months,
            format_money(plan.monthly_installment),
            plan.admin_fee * 100.0,
            plan.cost_ratio(),
        );
    }

    Ok(())
}

pub async fn cmd_recommend(
    db_path: &Path,
    category: &str,
    value: f64,
    budget: Option<f64>,
    json: bool,
) -> Result<()> {
    let category = parse_category(category)?;
    let catalog = load_catalog(db_path).await?;

    let profile = BuyerProfile {
        category,
        target_asset_value: value,
        monthly_budget: budget,
        bid_capacity: None,
        horizon_months: None,
    };

    let ai = NarrativeClient::from_env();
    if ai.is_none() {
        println!("💡 Tip: Set OLLAMA_HOST for AI-generated narratives");
    }

    let recommendation = Recommender::new(ai).recommend(&catalog, &profile).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendation)?);
        return Ok(());
    }

    println!("🏷️  Perfil: {}", recommendation.narrative.profile_label);
    println!();
    println!("{}", recommendation.narrative.summary);
    println!();
    println!("Planos recomendados:");
    for (i, plan) in recommendation.candidates.iter().enumerate() {
        println!(
            "  {}. {} ({}) - {} em {} meses, parcela {}",
            i + 1,
            plan.plan_name,
            plan.provider,
            format_money(plan.asset_value),
            plan.term_months,
            format_money(plan.monthly_installment),
        );
    }

    Ok(())
}
