//! Cota Web Server
//!
//! Axum-based REST API for the cota plan matcher:
//! - Catalog listing and tiered plan matching
//! - Sheet/JSON uploads into the session catalog
//! - Recommendations with narrative generation (and templated fallback)
//!
//! Input validation happens at this layer (category names, positive
//! target values, pagination clamps); the matching engine itself stays
//! total. Concurrent uploads are serialized through the catalog mutex,
//! so two quick file picks cannot lose each other's records.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::sync::Mutex;
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use cota_core::ai::{NarrativeBackend, NarrativeClient};
use cota_core::catalog::CatalogStore;
use cota_core::db::Database;
use cota_core::models::Plan;

mod handlers;

#[cfg(test)]
mod tests;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    /// The merged catalog; the mutex serializes ingest read-modify-write
    pub catalog: Mutex<CatalogStore>,
    pub db: Database,
    pub ai: Option<NarrativeClient>,
    pub config: ServerConfig,
}

/// Create the application router
pub fn create_router(
    store: CatalogStore,
    db: Database,
    ai: Option<NarrativeClient>,
    config: ServerConfig,
    static_dir: Option<&str>,
) -> Router {
    match &ai {
        Some(client) => {
            info!(
                "Narrative backend configured: {} (model: {})",
                client.host(),
                client.model()
            );
        }
        None => {
            info!("ℹ️  Narrative backend not configured (set OLLAMA_HOST to enable AI narratives)");
        }
    }

    let state = Arc::new(AppState {
        catalog: Mutex::new(store),
        db,
        ai,
        config: config.clone(),
    });

    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
    };

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/plans", get(handlers::list_plans))
        .route("/plans/match", get(handlers::match_plans))
        .route("/recommendations", post(handlers::create_recommendation))
        .route("/catalog/upload", post(handlers::upload_catalog))
        .route("/catalog/reset", post(handlers::reset_catalog))
        .route("/catalog/history", get(handlers::ingest_history));

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'self'"),
        ));

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve(
    db: Database,
    static_plans: Vec<Plan>,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    let store = CatalogStore::new(static_plans, Box::new(db.clone()));
    info!(
        static_count = store.static_count(),
        uploaded_count = store.uploaded_count(),
        "Catalog loaded"
    );

    let ai = NarrativeClient::from_env();
    if let Some(ref client) = ai {
        if client.health_check().await {
            info!("✅ Narrative backend reachable at {}", client.host());
        } else {
            warn!(
                "⚠️  Narrative backend at {} not responding; recommendations will use the templated fallback",
                client.host()
            );
        }
    }

    let app = create_router(store, db, ai, config, static_dir);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
