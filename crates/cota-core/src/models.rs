//! Domain models for cota

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Consórcio administrators the catalog is sourced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Alvorada,
    Horizonte,
    Meridional,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alvorada => "alvorada",
            Self::Horizonte => "horizonte",
            Self::Meridional => "meridional",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alvorada" => Ok(Self::Alvorada),
            "horizonte" => Ok(Self::Horizonte),
            "meridional" => Ok(Self::Meridional),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Asset segments a plan can fund
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Vehicle,
    RealEstate,
    HeavyEquipment,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vehicle => "vehicle",
            Self::RealEstate => "real_estate",
            Self::HeavyEquipment => "heavy_equipment",
        }
    }

    /// Display label in the catalog's own language
    pub fn label(&self) -> &'static str {
        match self {
            Self::Vehicle => "Veículos",
            Self::RealEstate => "Imóveis",
            Self::HeavyEquipment => "Pesados",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // Uploaded sheets and provider feeds use a mix of Portuguese and
        // English segment names
        match s.trim().to_lowercase().as_str() {
            "vehicle" | "veiculo" | "veículo" | "veiculos" | "veículos" | "auto" | "carro" => {
                Ok(Self::Vehicle)
            }
            "real_estate" | "realestate" | "imovel" | "imóvel" | "imoveis" | "imóveis"
            | "imobiliario" | "imobiliário" => Ok(Self::RealEstate),
            "heavy_equipment" | "heavy" | "pesado" | "pesados" | "caminhao" | "caminhão"
            | "maquinas" | "máquinas" => Ok(Self::HeavyEquipment),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Health of a plan's common fund, derived from bid history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundHealth {
    Critical,
    Stable,
    HighLiquidity,
}

impl FundHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Stable => "stable",
            Self::HighLiquidity => "high_liquidity",
        }
    }
}

impl std::str::FromStr for FundHealth {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" | "critico" | "crítico" => Ok(Self::Critical),
            "stable" | "estavel" | "estável" => Ok(Self::Stable),
            "high_liquidity" | "alta_liquidez" | "alta liquidez" => Ok(Self::HighLiquidity),
            _ => Err(format!("Unknown fund health: {}", s)),
        }
    }
}

/// Direction winning bids have been moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BidTrend {
    Rising,
    Stable,
    Falling,
}

impl BidTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Stable => "stable",
            Self::Falling => "falling",
        }
    }
}

impl std::str::FromStr for BidTrend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rising" | "subindo" | "alta" => Ok(Self::Rising),
            "stable" | "estavel" | "estável" => Ok(Self::Stable),
            "falling" | "caindo" | "queda" => Ok(Self::Falling),
            _ => Err(format!("Unknown bid trend: {}", s)),
        }
    }
}

/// Bid-history aggregates for a plan's group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStats {
    /// Average winning bid as a percentage of the credit
    pub avg_bid_pct: f64,
    /// Most recent winning bid percentage
    pub last_bid_pct: f64,
    /// Highest winning bid percentage on record
    pub max_bid_pct: f64,
    /// Contemplations per month across recent assemblies
    pub contemplations_per_month: f64,
    /// Assemblies already held (group age)
    pub assemblies_held: u32,
    pub fund_health: FundHealth,
    pub bid_trend: BidTrend,
}

/// A purchase plan in canonical, post-normalization shape
///
/// Invariants after normalization: `asset_value > 0` for any plan that
/// survives ingestion filters, `monthly_installment >= 0`, and `admin_fee`
/// is a fraction in [0, 1] regardless of how the source encoded it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub provider: Provider,
    pub plan_name: String,
    pub category: Category,
    /// Nominal credit amount in BRL
    pub asset_value: f64,
    /// Total installment count
    pub term_months: u32,
    pub monthly_installment: f64,
    /// Administration fee as a fraction of the credit
    pub admin_fee: f64,
    pub stats: Option<PlanStats>,
    /// Short marketing tags, in display order
    pub features: Vec<String>,
}

impl Plan {
    /// Composite identity for deduplication: plan name + provider + asset
    /// value, hashed for a stable storage key
    pub fn dedup_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.plan_name.as_bytes());
        hasher.update(self.provider.as_str().as_bytes());
        hasher.update(self.asset_value.to_be_bytes());
        hex::encode(hasher.finalize())
    }

    /// Monthly burden per unit of credit; lower is better
    ///
    /// Degraded records can carry a zero asset value, which would make the
    /// ratio meaningless. Those sort last.
    pub fn cost_ratio(&self) -> f64 {
        if self.asset_value > 0.0 {
            self.monthly_installment / self.asset_value
        } else {
            f64::INFINITY
        }
    }
}

/// Normalized buyer profile driving a match
///
/// Only `category` and `target_asset_value` are consumed by the matching
/// engine; the remaining fields feed narrative generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyerProfile {
    pub category: Category,
    pub target_asset_value: f64,
    #[serde(default)]
    pub monthly_budget: Option<f64>,
    #[serde(default)]
    pub bid_capacity: Option<f64>,
    #[serde(default)]
    pub horizon_months: Option<u32>,
}

/// Severity of an ingest log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestLogLevel {
    Info,
    Warn,
    Error,
}

impl IngestLogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// One operator-facing progress line emitted during ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestLogEntry {
    pub level: IngestLogLevel,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Which source produced the line (typically the uploaded filename)
    pub source: String,
}

impl IngestLogEntry {
    pub fn info(source: &str, message: impl Into<String>) -> Self {
        Self::new(IngestLogLevel::Info, source, message)
    }

    pub fn warn(source: &str, message: impl Into<String>) -> Self {
        Self::new(IngestLogLevel::Warn, source, message)
    }

    pub fn error(source: &str, message: impl Into<String>) -> Self {
        Self::new(IngestLogLevel::Error, source, message)
    }

    fn new(level: IngestLogLevel, source: &str, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            message: message.into(),
            source: source.to_string(),
        }
    }
}

/// Outcome of one upload ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub filename: String,
    /// None when the extension was not recognized
    pub format: Option<UploadFormat>,
    pub ingested: usize,
    pub skipped: usize,
    pub log: Vec<IngestLogEntry>,
}

/// Recognized upload file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadFormat {
    Json,
    Csv,
    Txt,
}

impl UploadFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Txt => "txt",
        }
    }

    /// Detect the format from a filename extension
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit('.').next()?.to_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "txt" | "tsv" => Some(Self::Txt),
            _ => None,
        }
    }
}

impl std::fmt::Display for UploadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded ingestion, as stored in history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRecord {
    pub id: i64,
    pub filename: String,
    pub format: Option<UploadFormat>,
    pub ingested: i64,
    pub skipped: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str() {
        assert_eq!("imóvel".parse::<Category>().unwrap(), Category::RealEstate);
        assert_eq!("Veículos".parse::<Category>().unwrap(), Category::Vehicle);
        assert_eq!(
            "heavy_equipment".parse::<Category>().unwrap(),
            Category::HeavyEquipment
        );
        assert!("boat".parse::<Category>().is_err());
    }

    #[test]
    fn test_dedup_key_composite_identity() {
        let plan = sample_plan("Grupo 1020", Provider::Alvorada, 300_000.0);
        let same = sample_plan("Grupo 1020", Provider::Alvorada, 300_000.0);
        let other_value = sample_plan("Grupo 1020", Provider::Alvorada, 310_000.0);
        let other_provider = sample_plan("Grupo 1020", Provider::Horizonte, 300_000.0);

        assert_eq!(plan.dedup_key(), same.dedup_key());
        assert_ne!(plan.dedup_key(), other_value.dedup_key());
        assert_ne!(plan.dedup_key(), other_provider.dedup_key());
    }

    #[test]
    fn test_cost_ratio_zero_value_sorts_last() {
        let mut degraded = sample_plan("Grupo X", Provider::Alvorada, 300_000.0);
        degraded.asset_value = 0.0;
        assert_eq!(degraded.cost_ratio(), f64::INFINITY);
    }

    #[test]
    fn test_upload_format_detection() {
        assert_eq!(
            UploadFormat::from_filename("tabela.CSV"),
            Some(UploadFormat::Csv)
        );
        assert_eq!(
            UploadFormat::from_filename("planos.json"),
            Some(UploadFormat::Json)
        );
        assert_eq!(
            UploadFormat::from_filename("export.tsv"),
            Some(UploadFormat::Txt)
        );
        assert_eq!(UploadFormat::from_filename("planos.xlsx"), None);
    }

    fn sample_plan(name: &str, provider: Provider, value: f64) -> Plan {
        Plan {
            provider,
            plan_name: name.to_string(),
            category: Category::RealEstate,
            asset_value: value,
            term_months: 180,
            monthly_installment: 1900.0,
            admin_fee: 0.19,
            stats: None,
            features: vec![],
        }
    }
}
