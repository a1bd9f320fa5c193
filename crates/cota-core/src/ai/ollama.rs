//! Ollama narrative backend
//!
//! HTTP client for a local Ollama server. The prompt packs the buyer
//! profile and the ranked candidates and asks for a JSON payload, which
//! gets extracted from whatever prose the model wraps around it.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{BuyerProfile, Plan};

use super::parsing::parse_narrative;
use super::types::Narrative;
use super::NarrativeBackend;

/// Ollama-backed narrative generation
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            model: model.to_string(),
        }
    }

    fn build_prompt(profile: &BuyerProfile, candidates: &[Plan]) -> String {
        let mut prompt = String::new();
        prompt.push_str(
            "Você é um consultor de consórcios. Analise o perfil do comprador e os \
             planos ranqueados abaixo e escreva uma recomendação curta.\n\n",
        );
        prompt.push_str(&format!(
            "Perfil: categoria {}, crédito alvo R$ {:.2}",
            profile.category.label(),
            profile.target_asset_value
        ));
        if let Some(budget) = profile.monthly_budget {
            prompt.push_str(&format!(", orçamento mensal R$ {:.2}", budget));
        }
        if let Some(bid) = profile.bid_capacity {
            prompt.push_str(&format!(", capacidade de lance R$ {:.2}", bid));
        }
        if let Some(horizon) = profile.horizon_months {
            prompt.push_str(&format!(", horizonte de {} meses", horizon));
        }
        prompt.push_str("\n\nPlanos (melhor parcela relativa primeiro):\n");

        for (i, plan) in candidates.iter().enumerate() {
            prompt.push_str(&format!(
                "{}. {} ({}) - crédito R$ {:.2}, parcela R$ {:.2}, {} meses, taxa {:.1}%\n",
                i + 1,
                plan.plan_name,
                plan.provider,
                plan.asset_value,
                plan.monthly_installment,
                plan.term_months,
                plan.admin_fee * 100.0
            ));
        }

        prompt.push_str(
            "\nResponda APENAS com um objeto JSON: \
             {\"summary\": \"recomendação em 2-3 frases\", \
             \"profile_label\": \"rótulo curto do perfil\"}",
        );
        prompt
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl NarrativeBackend for OllamaBackend {
    async fn generate_narrative(
        &self,
        profile: &BuyerProfile,
        candidates: &[Plan],
    ) -> Result<Narrative> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: Self::build_prompt(profile, candidates),
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Http(response.error_for_status().unwrap_err()));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        debug!("Ollama response: {}", ollama_response.response);

        parse_narrative(&ollama_response.response, &self.model)
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::test_utils::MockNarrativeServer;

    fn profile() -> BuyerProfile {
        BuyerProfile {
            category: Category::Vehicle,
            target_asset_value: 50_000.0,
            monthly_budget: None,
            bid_capacity: None,
            horizon_months: None,
        }
    }

    #[tokio::test]
    async fn test_generate_against_mock_server() {
        let server = MockNarrativeServer::start().await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");
        assert!(backend.health_check().await);

        let plans = vec![crate::matching::synthetic_plan(Category::Vehicle, 50_000.0)];
        let narrative = backend.generate_narrative(&profile(), &plans).await.unwrap();

        assert_eq!(narrative.model, "llama3.2");
        assert_eq!(narrative.profile_label, "Planejador");
        assert!(!narrative.summary.is_empty());
    }

    #[tokio::test]
    async fn test_generate_fails_when_server_is_gone() {
        let mut server = MockNarrativeServer::start().await;
        let url = server.url();
        server.stop();
        // Give the listener a moment to close
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let backend = OllamaBackend::new(&url, "llama3.2");
        let plans = vec![crate::matching::synthetic_plan(Category::Vehicle, 50_000.0)];
        assert!(backend.generate_narrative(&profile(), &plans).await.is_err());
        assert!(!backend.health_check().await);
    }

    #[test]
    fn test_build_prompt_includes_profile_and_plans() {
        let profile = BuyerProfile {
            category: Category::Vehicle,
            target_asset_value: 50_000.0,
            monthly_budget: Some(900.0),
            bid_capacity: None,
            horizon_months: Some(36),
        };
        let plan = crate::matching::synthetic_plan(Category::Vehicle, 50_000.0);

        let prompt = OllamaBackend::build_prompt(&profile, &[plan]);
        assert!(prompt.contains("Veículos"));
        assert!(prompt.contains("orçamento mensal"));
        assert!(prompt.contains("horizonte de 36 meses"));
        assert!(prompt.contains("Plano Referência"));
        assert!(prompt.contains("profile_label"));
    }
}
