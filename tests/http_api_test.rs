mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use daigou_api::config::AppConfig;
use daigou_api::{app_router, AppState};

async fn test_app() -> Router {
    let db = common::setup_test_db().await;
    let mut config = AppConfig::default();
    config.export.export_dir = std::env::temp_dir()
        .join("daigou-api-test-exports")
        .to_string_lossy()
        .into_owned();
    let state = AppState::new(db, config, None).expect("construct state");
    app_router(state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = test_app().await;
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn product_import_roundtrips_through_the_api() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/products/import",
            json!({
                "source_url": "https://item.example.com/backpack",
                "source_site": "TAOBAO",
                "raw_title": "背包",
                "raw_price": 100,
                "raw_currency": "CNY",
                "image_urls": ["https://img.example.com/backpack.jpg"],
                "options": [
                    { "option_key": "color", "raw_name": "红色", "raw_price_diff": 10 }
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = response_json(response).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["options"].as_array().unwrap().len(), 1);

    let response = app
        .oneshot(
            Request::get(format!("/api/products/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = response_json(response).await;
    assert_eq!(fetched["raw_title"], "背包");
}

#[tokio::test]
async fn missing_order_returns_the_error_body() {
    let app = test_app().await;
    let response = app
        .oneshot(Request::get("/api/orders/9999").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response_json(response).await;
    assert_eq!(body["error"], "Not Found");
    assert!(body["message"].as_str().unwrap().contains("Order not found"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn empty_export_request_is_a_bad_request() {
    let app = test_app().await;
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/exports/channel/smartstore",
            json!({ "product_ids": [] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn export_download_sets_csv_headers() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/products/import",
            json!({
                "source_url": "https://item.example.com/cup",
                "source_site": "TAOBAO",
                "raw_title": "컵",
                "raw_price": 5,
                "raw_currency": "CNY"
            }),
        ))
        .await
        .unwrap();
    let id = response_json(response).await["id"].as_i64().unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/exports/channel/smartstore",
            json!({ "product_ids": [id] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("attachment; filename=\"smartstore_products_"));
    assert!(disposition.ends_with(".csv\""));
}
