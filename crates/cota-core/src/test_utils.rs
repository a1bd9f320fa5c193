//! Test utilities for cota-core
//!
//! Provides a mock narrative server speaking the Ollama HTTP API, so the
//! reqwest backend can be exercised in integration tests without a real
//! LLM server.

use axum::{
    extract::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// Mock Ollama-compatible server for testing
pub struct MockNarrativeServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockNarrativeServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockNarrativeServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2026-01-01T00:00:00Z".to_string(),
            size: 4_000_000_000,
        }],
    })
}

/// Ollama generate endpoint: wraps a narrative payload in prose, the way
/// real models do
async fn handle_generate(Json(_request): Json<GenerateRequest>) -> Json<GenerateResponse> {
    let payload = r#"{"summary": "O primeiro plano da lista combina a menor parcela relativa com um grupo maduro.", "profile_label": "Planejador"}"#;
    Json(GenerateResponse {
        response: format!("Aqui está a análise solicitada:\n{}\nBoa sorte!", payload),
        done: true,
    })
}

#[derive(Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[derive(Deserialize)]
struct GenerateRequest {
    #[allow(dead_code)]
    model: String,
    #[allow(dead_code)]
    prompt: String,
    #[allow(dead_code)]
    #[serde(default)]
    stream: bool,
}

#[derive(Serialize)]
struct GenerateResponse {
    response: String,
    done: bool,
}
