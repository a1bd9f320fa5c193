//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use cota_core::providers::{fetch_catalog, instant_connectors};
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn setup_test_app() -> Router {
    let db = Database::in_memory().unwrap();
    let static_plans = fetch_catalog(instant_connectors()).await.unwrap();
    let store = CatalogStore::new(static_plans, Box::new(db.clone()));
    create_router(store, db, None, ServerConfig::default(), None)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_csv_request(uri: &str, filename: &str, contents: &str) -> Request<Body> {
    let boundary = "cota-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"provider\"\r\n\r\n\
         meridional\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {contents}\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

// ========== Health ==========

#[tokio::test]
async fn test_health() {
    let app = setup_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["static_plans"].as_u64().unwrap() >= 15);
    assert_eq!(json["uploaded_plans"], 0);
    assert!(json["narrative_backend"].is_null());
}

// ========== Plans ==========

#[tokio::test]
async fn test_list_plans_with_category_filter() {
    let app = setup_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/plans?category=real_estate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let plans = json["plans"].as_array().unwrap();
    assert!(!plans.is_empty());
    assert!(plans
        .iter()
        .all(|plan| plan["category"] == "real_estate"));
}

#[tokio::test]
async fn test_list_plans_rejects_unknown_category() {
    let app = setup_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/plans?category=boat")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_match_returns_ranked_plans() {
    let app = setup_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/plans/match?category=vehicle&value=60000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let plans = json["plans"].as_array().unwrap();
    assert!(!plans.is_empty());

    // Ranked ascending by installment/value ratio
    let ratios: Vec<f64> = plans
        .iter()
        .map(|plan| {
            plan["monthly_installment"].as_f64().unwrap() / plan["asset_value"].as_f64().unwrap()
        })
        .collect();
    for pair in ratios.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
}

#[tokio::test]
async fn test_match_respects_limit() {
    let app = setup_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/plans/match?category=vehicle&value=60000&limit=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert!(json["plans"].as_array().unwrap().len() <= 2);
}

#[tokio::test]
async fn test_match_rejects_non_positive_value() {
    let app = setup_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/plans/match?category=vehicle&value=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Recommendations ==========

#[tokio::test]
async fn test_recommendation_uses_fallback_without_backend() {
    let app = setup_test_app().await;

    let body = serde_json::json!({
        "category": "real_estate",
        "target_asset_value": 300000.0,
        "monthly_budget": 2000.0
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/recommendations")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert!(!json["candidates"].as_array().unwrap().is_empty());
    assert_eq!(json["narrative"]["model"], "template");
    assert!(!json["narrative"]["summary"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_recommendation_rejects_bad_profile() {
    let app = setup_test_app().await;

    let body = serde_json::json!({
        "category": "vehicle",
        "target_asset_value": -5.0
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/recommendations")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Catalog Upload / Reset / History ==========

#[tokio::test]
async fn test_upload_then_match_sees_new_plans() {
    let db = Database::in_memory().unwrap();
    let static_plans = fetch_catalog(instant_connectors()).await.unwrap();
    let store = CatalogStore::new(static_plans, Box::new(db.clone()));
    let app = create_router(store, db, None, ServerConfig::default(), None);

    let sheet = "GRUPO;CREDITO;PRAZO;PARCELA;TAXA\n9001;64000;84;780;17,0";
    let response = app
        .clone()
        .oneshot(multipart_csv_request("/api/catalog/upload", "grupos.csv", sheet))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report = get_body_json(response).await;
    assert_eq!(report["ingested"], 1);
    assert_eq!(report["format"], "csv");
    assert!(!report["log"].as_array().unwrap().is_empty());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/plans/match?category=vehicle&value=64000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    let names: Vec<&str> = json["plans"]
        .as_array()
        .unwrap()
        .iter()
        .map(|plan| plan["plan_name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"9001"));
}

#[tokio::test]
async fn test_upload_unsupported_extension_rejected() {
    let app = setup_test_app().await;

    let response = app
        .oneshot(multipart_csv_request(
            "/api/catalog/upload",
            "planilha.xlsx",
            "conteúdo",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reset_clears_uploaded_set() {
    let app = setup_test_app().await;

    let sheet = "GRUPO;CREDITO;PRAZO;PARCELA\n9001;64000;84;880";
    app.clone()
        .oneshot(multipart_csv_request("/api/catalog/upload", "grupos.csv", sheet))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/catalog/reset")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["uploaded_plans"], 0);
}

#[tokio::test]
async fn test_ingest_history_lists_uploads() {
    let app = setup_test_app().await;

    let sheet = "GRUPO;CREDITO;PRAZO;PARCELA\n9001;64000;84;880";
    app.clone()
        .oneshot(multipart_csv_request("/api/catalog/upload", "grupos.csv", sheet))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/catalog/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let history = json.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["filename"], "grupos.csv");
    assert_eq!(history[0]["ingested"], 1);
}
