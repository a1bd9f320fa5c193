//! Mock provider connectors
//!
//! One connector per administrator, each returning raw records in that
//! provider's native shape after a simulated network delay. These are
//! stand-ins for future real integrations: no auth, no pagination, no
//! error path beyond a malformed fixture. The aggregator fans all
//! connectors out concurrently and joins before normalizing.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Plan, Provider};
use crate::normalize::{normalize_record, RawRecord};

const ALVORADA_PLANS: &str = include_str!("../data/alvorada.json");
const HORIZONTE_PLANS: &str = include_str!("../data/horizonte.json");
const MERIDIONAL_PLANS: &str = include_str!("../data/meridional.json");

/// A source of provider-native raw plan records
#[async_trait]
pub trait ProviderConnector: Send + Sync {
    /// Which administrator this connector speaks for
    fn provider(&self) -> Provider;

    /// Fetch the provider's current plan list, in provider-native shape
    async fn fetch_plans(&self) -> Result<Vec<RawRecord>>;
}

/// Mock connector serving a bundled fixture after a fixed delay
pub struct MockConnector {
    provider: Provider,
    latency: Duration,
    fixture: &'static str,
}

impl MockConnector {
    fn new(provider: Provider, latency_ms: u64, fixture: &'static str) -> Self {
        Self {
            provider,
            latency: Duration::from_millis(latency_ms),
            fixture,
        }
    }

    /// Same connector without the simulated delay (for tests)
    pub fn instant(mut self) -> Self {
        self.latency = Duration::ZERO;
        self
    }

    pub fn alvorada() -> Self {
        Self::new(Provider::Alvorada, 350, ALVORADA_PLANS)
    }

    pub fn horizonte() -> Self {
        Self::new(Provider::Horizonte, 400, HORIZONTE_PLANS)
    }

    pub fn meridional() -> Self {
        Self::new(Provider::Meridional, 450, MERIDIONAL_PLANS)
    }
}

#[async_trait]
impl ProviderConnector for MockConnector {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn fetch_plans(&self) -> Result<Vec<RawRecord>> {
        sleep(self.latency).await;
        let records: Vec<RawRecord> = serde_json::from_str(self.fixture)?;
        debug!(provider = %self.provider, count = records.len(), "Fetched provider plans");
        Ok(records)
    }
}

/// The full connector set with production latencies
pub fn default_connectors() -> Vec<Box<dyn ProviderConnector>> {
    vec![
        Box::new(MockConnector::alvorada()),
        Box::new(MockConnector::horizonte()),
        Box::new(MockConnector::meridional()),
    ]
}

/// The full connector set with latency removed (for tests)
pub fn instant_connectors() -> Vec<Box<dyn ProviderConnector>> {
    vec![
        Box::new(MockConnector::alvorada().instant()),
        Box::new(MockConnector::horizonte().instant()),
        Box::new(MockConnector::meridional().instant()),
    ]
}

/// Fan out connector fetches concurrently, join, and normalize
///
/// Results keep connector order so the assembled base is deterministic.
pub async fn fetch_catalog(connectors: Vec<Box<dyn ProviderConnector>>) -> Result<Vec<Plan>> {
    let mut handles = Vec::with_capacity(connectors.len());
    for connector in connectors {
        handles.push(tokio::spawn(async move {
            let provider = connector.provider();
            let records = connector.fetch_plans().await?;
            Ok::<_, Error>((provider, records))
        }));
    }

    let mut plans = Vec::new();
    for handle in handles {
        let (provider, records) = handle
            .await
            .map_err(|e| Error::Connector(format!("connector task failed: {}", e)))??;
        for record in &records {
            plans.push(normalize_record(record, provider));
        }
    }

    debug!(count = plans.len(), "Assembled static base catalog");
    Ok(plans)
}

/// Load the static base from all providers with production latencies
pub async fn fetch_base_catalog() -> Result<Vec<Plan>> {
    fetch_catalog(default_connectors()).await
}
