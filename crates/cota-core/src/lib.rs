//! Cota Core Library
//!
//! Shared functionality for the cota consórcio plan matcher:
//! - Schema normalizer for heterogeneous raw plan records
//! - Delimited-sheet parser with header detection
//! - Catalog store with pluggable persistence
//! - Tiered matching engine with graceful degradation
//! - Cost-efficiency ranker
//! - Mock provider connectors with concurrent fan-out
//! - Pluggable narrative backends (Ollama, mock) with templated fallback

pub mod ai;
pub mod catalog;
pub mod db;
pub mod delimited;
pub mod error;
pub mod ingest;
pub mod matching;
pub mod models;
pub mod normalize;
pub mod providers;
pub mod rank;
pub mod recommend;

/// Test utilities including mock narrative server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{MockBackend, Narrative, NarrativeBackend, NarrativeClient, OllamaBackend};
pub use catalog::{CatalogStore, MemoryPersistence, PlanPersistence};
pub use db::Database;
pub use error::{Error, Result};
pub use ingest::{ingest_file, parse_upload};
pub use matching::find_candidates;
pub use models::{
    BidTrend, BuyerProfile, Category, FundHealth, IngestLogEntry, IngestLogLevel, IngestRecord,
    IngestReport, Plan, PlanStats, Provider, UploadFormat,
};
pub use normalize::{normalize_record, RawRecord};
pub use providers::{fetch_base_catalog, fetch_catalog, ProviderConnector};
pub use rank::rank;
pub use recommend::{fallback_narrative, Recommendation, Recommender};
