//! Pluggable narrative generation backends
//!
//! The recommendation pipeline treats narrative generation as an opaque
//! external text service: it hands over the buyer profile and the ranked
//! candidates and gets back a summary plus a short profile label. Any
//! backend failure is absorbed by the caller with a deterministic
//! templated fallback — a broken LLM must never surface as an error to
//! the buyer.
//!
//! # Configuration
//!
//! Environment variables:
//! - `NARRATIVE_BACKEND`: Backend to use (ollama, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)

mod mock;
mod ollama;
pub mod parsing;
pub mod types;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use types::Narrative;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{BuyerProfile, Plan};

/// Trait defining the interface for narrative backends
#[async_trait]
pub trait NarrativeBackend: Send + Sync {
    /// Generate a recommendation narrative for a profile and its ranked
    /// candidates (callers pass at most ten)
    async fn generate_narrative(
        &self,
        profile: &BuyerProfile,
        candidates: &[Plan],
    ) -> Result<Narrative>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete narrative client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum NarrativeClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl NarrativeClient {
    /// Create a narrative client from environment variables
    ///
    /// Returns None if the required environment variables are not set —
    /// the pipeline then runs on the templated fallback alone.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("NARRATIVE_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(NarrativeClient::Ollama),
            "mock" => Some(NarrativeClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown NARRATIVE_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(NarrativeClient::Ollama)
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        NarrativeClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        NarrativeClient::Mock(MockBackend::new())
    }
}

// Implement NarrativeBackend for NarrativeClient by delegating to the
// inner backend
#[async_trait]
impl NarrativeBackend for NarrativeClient {
    async fn generate_narrative(
        &self,
        profile: &BuyerProfile,
        candidates: &[Plan],
    ) -> Result<Narrative> {
        match self {
            NarrativeClient::Ollama(b) => b.generate_narrative(profile, candidates).await,
            NarrativeClient::Mock(b) => b.generate_narrative(profile, candidates).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            NarrativeClient::Ollama(b) => b.health_check().await,
            NarrativeClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            NarrativeClient::Ollama(b) => b.model(),
            NarrativeClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            NarrativeClient::Ollama(b) => b.host(),
            NarrativeClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrative_client_mock() {
        let client = NarrativeClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let client = NarrativeClient::mock();
        assert!(client.health_check().await);
    }
}
