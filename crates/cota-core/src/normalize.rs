//! Schema normalizer for heterogeneous raw plan records
//!
//! Raw records arrive as generic string-keyed JSON maps from the bundled
//! dataset, session uploads, or provider feeds. Each source spells fields
//! its own way, so every canonical field resolves through an ordered list
//! of synonym keys (canonical key first) and falls back to a deterministic
//! default. Normalization never fails on a bad record.

use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{BidTrend, Category, FundHealth, Plan, PlanStats, Provider};

/// A raw plan record as received from any source
pub type RawRecord = Map<String, Value>;

/// Fee applied when the source supplies none
pub const DEFAULT_ADMIN_FEE: f64 = 0.15;

/// Term applied when the source supplies none (or a non-positive one)
pub const DEFAULT_TERM_MONTHS: u32 = 80;

// Synonym keys per canonical field, canonical key first. Matching is
// case-insensitive on the raw key.
const NAME_KEYS: &[&str] = &["plan", "plano", "name", "nome", "grupo", "group", "descricao"];
const CREDIT_KEYS: &[&str] = &["credit", "credito", "crédito", "valor_credito", "valor", "saldo"];
const TERM_KEYS: &[&str] = &["term", "prazo", "meses", "term_months", "parcelas"];
const INSTALLMENT_KEYS: &[&str] = &["installment", "parcela", "mensalidade", "valor_parcela"];
const FEE_KEYS: &[&str] = &["fee", "taxa", "tx_adm", "taxa_adm", "admin_fee"];
const CATEGORY_KEYS: &[&str] = &["type", "category", "tipo", "categoria", "segmento"];
const PROVIDER_KEYS: &[&str] = &["provider", "administradora", "admin"];
const FEATURE_KEYS: &[&str] = &["features", "tags", "beneficios", "destaques"];
const HOT_KEYS: &[&str] = &["hot", "destaque", "em_alta"];

const AVG_BID_KEYS: &[&str] = &["avg_bid_pct", "media_lance", "lance_medio"];
const LAST_BID_KEYS: &[&str] = &["last_bid_pct", "ultimo_lance"];
const MAX_BID_KEYS: &[&str] = &["max_bid_pct", "lance_maximo"];
const CONTEMPLATION_KEYS: &[&str] = &["contemplations_per_month", "contemplacoes_mes"];
const ASSEMBLIES_KEYS: &[&str] = &["assemblies_held", "assembleias"];
const FUND_HEALTH_KEYS: &[&str] = &["fund_health", "saude_fundo"];
const BID_TREND_KEYS: &[&str] = &["bid_trend", "tendencia_lance"];

/// Normalize one raw record into a canonical [`Plan`]
///
/// `default_provider` is used when the record carries no recognizable
/// provider field. Missing numeric fields default to 0, the admin fee to
/// 0.15 and the term to 80 months; a fee supplied as a percentage (> 1)
/// is converted to a fraction.
pub fn normalize_record(raw: &RawRecord, default_provider: Provider) -> Plan {
    let plan_name = resolve_string(raw, NAME_KEYS)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Plano sem nome".to_string());

    let asset_value = resolve_number(raw, CREDIT_KEYS).unwrap_or(0.0);
    let monthly_installment = resolve_number(raw, INSTALLMENT_KEYS).unwrap_or(0.0);

    // Sources export the term as "80" or "80 meses"; zero and negative
    // resolutions fall back to the default like a missing field
    let term_months = resolve_number(raw, TERM_KEYS)
        .filter(|v| *v > 0.0)
        .map(|v| v as u32)
        .unwrap_or(DEFAULT_TERM_MONTHS);

    let admin_fee = normalize_fee(resolve_number(raw, FEE_KEYS).unwrap_or(DEFAULT_ADMIN_FEE));

    let provider = resolve_string(raw, PROVIDER_KEYS)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default_provider);

    // Explicit category wins; otherwise infer from the asset value
    let category = resolve_string(raw, CATEGORY_KEYS)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| infer_category(asset_value));

    let stats = resolve_stats(raw).or_else(|| Some(synthesize_stats(resolve_hot(raw))));

    let plan = Plan {
        provider,
        plan_name,
        category,
        asset_value,
        term_months,
        monthly_installment,
        admin_fee,
        stats,
        features: resolve_features(raw),
    };
    debug!(
        plan = %plan.plan_name,
        provider = %plan.provider,
        category = %plan.category,
        value = plan.asset_value,
        "Normalized raw record"
    );
    plan
}

/// Infer a category from the asset value magnitude
///
/// Known to be imprecise: the divisibility-by-10,000 test is how the
/// upstream catalog distinguishes financed property credit from equipment
/// credit, and a 300k+ value that happens to be round lands on RealEstate.
/// Only used when the source has no explicit category field.
pub fn infer_category(asset_value: f64) -> Category {
    if asset_value >= 200_000.0 && (asset_value % 10_000.0).abs() < f64::EPSILON {
        Category::RealEstate
    } else if asset_value >= 300_000.0 {
        Category::HeavyEquipment
    } else {
        Category::Vehicle
    }
}

/// Convert a fee to a fraction when the source supplied a percentage
pub fn normalize_fee(fee: f64) -> f64 {
    if fee > 1.0 {
        fee / 100.0
    } else {
        fee
    }
}

/// Parse a currency-like string ("R$ 1.234,56", "1650", "19,5")
///
/// Strips the currency symbol and thousands separators, converts a comma
/// decimal separator to a period, then parses. A failed parse yields 0.
pub fn parse_money(s: &str) -> f64 {
    let cleaned: String = s
        .trim()
        .trim_start_matches("R$")
        .trim_start_matches('$')
        .replace([' ', '\u{a0}'], "");

    // Brazilian encoding uses '.' for thousands and ',' for decimals; when
    // no comma is present the string is already machine-formatted
    let cleaned = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    cleaned.parse::<f64>().unwrap_or(0.0)
}

/// Resolve a field through its synonym list, first match wins
fn resolve_value<'a>(raw: &'a RawRecord, keys: &[&str]) -> Option<&'a Value> {
    for key in keys {
        if let Some((_, value)) = raw.iter().find(|(k, _)| k.to_lowercase() == *key) {
            if !value.is_null() {
                return Some(value);
            }
        }
    }
    None
}

fn resolve_number(raw: &RawRecord, keys: &[&str]) -> Option<f64> {
    resolve_value(raw, keys).map(|value| match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_money(s),
        _ => 0.0,
    })
}

fn resolve_string(raw: &RawRecord, keys: &[&str]) -> Option<String> {
    resolve_value(raw, keys).map(|value| match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}

/// Whether the source flagged this plan as a highlighted ("hot") offer
fn resolve_hot(raw: &RawRecord) -> bool {
    match resolve_value(raw, HOT_KEYS) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0) != 0.0,
        Some(Value::String(s)) => {
            matches!(s.trim().to_lowercase().as_str(), "true" | "sim" | "yes" | "1")
        }
        _ => false,
    }
}

fn resolve_features(raw: &RawRecord) -> Vec<String> {
    match resolve_value(raw, FEATURE_KEYS) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => vec![],
    }
}

/// Build stats from source-provided bid history, if any is present
///
/// Sources either nest the aggregates under a `stats` object or flatten
/// them into the record. A record counts as carrying stats when an average
/// bid resolves; the remaining fields get per-field defaults.
fn resolve_stats(raw: &RawRecord) -> Option<PlanStats> {
    let nested = match resolve_value(raw, &["stats", "historico"]) {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    };
    let source = nested.unwrap_or(raw);

    let avg_bid_pct = resolve_number(source, AVG_BID_KEYS)?;
    Some(PlanStats {
        avg_bid_pct,
        last_bid_pct: resolve_number(source, LAST_BID_KEYS).unwrap_or(avg_bid_pct),
        max_bid_pct: resolve_number(source, MAX_BID_KEYS).unwrap_or(avg_bid_pct),
        contemplations_per_month: resolve_number(source, CONTEMPLATION_KEYS).unwrap_or(1.0),
        assemblies_held: resolve_number(source, ASSEMBLIES_KEYS).unwrap_or(0.0) as u32,
        fund_health: resolve_string(source, FUND_HEALTH_KEYS)
            .and_then(|s| s.parse().ok())
            .unwrap_or(FundHealth::Stable),
        bid_trend: resolve_string(source, BID_TREND_KEYS)
            .and_then(|s| s.parse().ok())
            .unwrap_or(BidTrend::Stable),
    })
}

/// Synthesize a stats block for sources that publish no bid history
///
/// Hot offers get the favorable profile (lower average bid, liquid fund);
/// everything else gets the conservative one.
pub fn synthesize_stats(hot: bool) -> PlanStats {
    if hot {
        PlanStats {
            avg_bid_pct: 35.0,
            last_bid_pct: 33.0,
            max_bid_pct: 48.0,
            contemplations_per_month: 3.0,
            assemblies_held: 24,
            fund_health: FundHealth::HighLiquidity,
            bid_trend: BidTrend::Falling,
        }
    } else {
        PlanStats {
            avg_bid_pct: 42.5,
            last_bid_pct: 44.0,
            max_bid_pct: 55.0,
            contemplations_per_month: 1.5,
            assemblies_held: 12,
            fund_health: FundHealth::Stable,
            bid_trend: BidTrend::Stable,
        }
    }
}
