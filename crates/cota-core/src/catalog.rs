//! Catalog store: static base plans merged with session-uploaded plans
//!
//! The static base is loaded once at startup and never mutated; the
//! uploaded set grows through ingestion, survives restarts through an
//! injected persistence backend, and can be cleared on demand. Reads
//! always see the deduplicated union, with uploaded entries winning
//! composite-key collisions.

use std::collections::HashSet;
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{Plan, Provider};
use crate::normalize::{normalize_record, RawRecord};

/// Durable storage for the uploaded plan set
///
/// Writes are fire-and-forget: the store logs a failed save and carries
/// on, since the catalog is always reconstructible from the static base.
pub trait PlanPersistence: Send + Sync {
    fn load(&self) -> Result<Vec<Plan>>;
    fn save(&self, plans: &[Plan]) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// In-memory persistence for tests and ephemeral CLI runs
#[derive(Default)]
pub struct MemoryPersistence {
    plans: Mutex<Vec<Plan>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlanPersistence for MemoryPersistence {
    fn load(&self) -> Result<Vec<Plan>> {
        let plans = self
            .plans
            .lock()
            .map_err(|_| Error::InvalidData("persistence lock poisoned".into()))?;
        Ok(plans.clone())
    }

    fn save(&self, plans: &[Plan]) -> Result<()> {
        let mut stored = self
            .plans
            .lock()
            .map_err(|_| Error::InvalidData("persistence lock poisoned".into()))?;
        *stored = plans.to_vec();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut stored = self
            .plans
            .lock()
            .map_err(|_| Error::InvalidData("persistence lock poisoned".into()))?;
        stored.clear();
        Ok(())
    }
}

/// The merged, deduplicated plan pool
pub struct CatalogStore {
    static_plans: Vec<Plan>,
    uploaded: Vec<Plan>,
    persistence: Box<dyn PlanPersistence>,
}

impl CatalogStore {
    /// Build a store over a static base, restoring any previously
    /// persisted uploaded set
    pub fn new(static_plans: Vec<Plan>, persistence: Box<dyn PlanPersistence>) -> Self {
        let uploaded = match persistence.load() {
            Ok(plans) => dedup_by_key(plans),
            Err(e) => {
                warn!(error = %e, "Failed to restore uploaded plans, starting empty");
                vec![]
            }
        };
        debug!(
            static_count = static_plans.len(),
            uploaded_count = uploaded.len(),
            "Catalog store ready"
        );
        Self {
            static_plans,
            uploaded,
            persistence,
        }
    }

    /// Normalize and ingest a batch of raw records into the uploaded set
    ///
    /// The new batch is prepended ahead of earlier uploads so the most
    /// recent record wins a composite-key collision. Records that fail to
    /// parse degrade to defaulted values rather than raising; the call
    /// always succeeds. Returns the batch size.
    pub fn ingest_upload(&mut self, raw_records: &[RawRecord], provider_hint: Provider) -> usize {
        let batch: Vec<Plan> = raw_records
            .iter()
            .map(|record| normalize_record(record, provider_hint))
            .collect();
        let ingested = batch.len();

        let mut merged = batch;
        merged.append(&mut self.uploaded);
        self.uploaded = dedup_by_key(merged);

        self.persist();
        debug!(
            ingested,
            uploaded_total = self.uploaded.len(),
            "Ingested upload batch"
        );
        ingested
    }

    /// Clear the uploaded set; the static base is untouched. Idempotent.
    pub fn reset(&mut self) {
        self.uploaded.clear();
        if let Err(e) = self.persistence.clear() {
            warn!(error = %e, "Failed to clear persisted uploads");
        }
    }

    /// The full catalog: uploaded set union static base, deduplicated with
    /// uploaded entries winning ties
    pub fn all(&self) -> Vec<Plan> {
        dedup_by_key(
            self.uploaded
                .iter()
                .chain(self.static_plans.iter())
                .cloned()
                .collect(),
        )
    }

    pub fn static_count(&self) -> usize {
        self.static_plans.len()
    }

    pub fn uploaded_count(&self) -> usize {
        self.uploaded.len()
    }

    fn persist(&self) {
        // Fire-and-forget: a lost write only costs re-uploading a sheet
        if let Err(e) = self.persistence.save(&self.uploaded) {
            warn!(error = %e, "Failed to persist uploaded plans");
        }
    }
}

/// Keep the first occurrence of each composite key, preserving order
fn dedup_by_key(plans: Vec<Plan>) -> Vec<Plan> {
    let mut seen = HashSet::new();
    plans
        .into_iter()
        .filter(|plan| seen.insert(plan.dedup_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use serde_json::json;

    fn record(name: &str, credit: f64, installment: f64) -> RawRecord {
        json!({ "plano": name, "credito": credit, "parcela": installment })
            .as_object()
            .unwrap()
            .clone()
    }

    fn static_plan(name: &str, value: f64) -> Plan {
        Plan {
            provider: Provider::Alvorada,
            plan_name: name.to_string(),
            category: Category::Vehicle,
            asset_value: value,
            term_months: 80,
            monthly_installment: value / 70.0,
            admin_fee: 0.15,
            stats: None,
            features: vec![],
        }
    }

    fn store_with(static_plans: Vec<Plan>) -> CatalogStore {
        CatalogStore::new(static_plans, Box::new(MemoryPersistence::new()))
    }

    #[test]
    fn test_ingest_grows_catalog() {
        let mut store = store_with(vec![static_plan("Base", 50_000.0)]);
        store.ingest_upload(&[record("Novo", 60_000.0, 850.0)], Provider::Horizonte);

        assert_eq!(store.uploaded_count(), 1);
        assert_eq!(store.all().len(), 2);
    }

    #[test]
    fn test_dedup_is_idempotent_across_repeated_ingests() {
        let mut store = store_with(vec![]);
        let batch = [
            record("A", 50_000.0, 700.0),
            record("B", 60_000.0, 800.0),
        ];

        store.ingest_upload(&batch, Provider::Alvorada);
        let first = store.all().len();
        store.ingest_upload(&batch, Provider::Alvorada);

        assert_eq!(store.all().len(), first);
    }

    #[test]
    fn test_uploaded_plan_wins_collision_with_static() {
        // Same composite key (name + provider + value), different installment
        let mut base = static_plan("Grupo 10", 50_000.0);
        base.monthly_installment = 999.0;
        let mut store = store_with(vec![base]);

        store.ingest_upload(&[record("Grupo 10", 50_000.0, 640.0)], Provider::Alvorada);

        let all = store.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].monthly_installment, 640.0);
    }

    #[test]
    fn test_newer_upload_wins_within_uploaded_set() {
        let mut store = store_with(vec![]);
        store.ingest_upload(&[record("G1", 50_000.0, 700.0)], Provider::Alvorada);
        store.ingest_upload(&[record("G1", 50_000.0, 650.0)], Provider::Alvorada);

        let all = store.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].monthly_installment, 650.0);
    }

    #[test]
    fn test_reset_clears_uploads_only_and_is_idempotent() {
        let mut store = store_with(vec![static_plan("Base", 50_000.0)]);
        store.ingest_upload(&[record("Novo", 60_000.0, 850.0)], Provider::Horizonte);

        store.reset();
        assert_eq!(store.uploaded_count(), 0);
        assert_eq!(store.all().len(), 1);

        store.reset();
        assert_eq!(store.all().len(), 1);
    }

    #[test]
    fn test_uploads_survive_restart_via_persistence() {
        let persistence = std::sync::Arc::new(MemoryPersistence::new());

        struct Shared(std::sync::Arc<MemoryPersistence>);
        impl PlanPersistence for Shared {
            fn load(&self) -> Result<Vec<Plan>> {
                self.0.load()
            }
            fn save(&self, plans: &[Plan]) -> Result<()> {
                self.0.save(plans)
            }
            fn clear(&self) -> Result<()> {
                self.0.clear()
            }
        }

        let mut store = CatalogStore::new(vec![], Box::new(Shared(persistence.clone())));
        store.ingest_upload(&[record("Persistido", 70_000.0, 900.0)], Provider::Meridional);
        drop(store);

        let restored = CatalogStore::new(vec![], Box::new(Shared(persistence)));
        assert_eq!(restored.uploaded_count(), 1);
    }
}
