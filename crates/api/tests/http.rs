//! HTTP tests driving the router in-process

use api::{create_router, AppState};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

fn app() -> Router {
    create_router(Arc::new(RwLock::new(AppState::default())))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn model(leaf: f64) -> Value {
    json!({
        "schema": {"features": [
            {"name": "transaction_count", "kind": "numeric"},
            {"name": "sex", "kind": {"categorical": ["f", "m"]}}
        ]},
        "trees": [{"nodes": [
            {"feature": 0, "threshold": 1.5, "left": 1, "right": 2},
            {"value": -leaf},
            {"value": leaf}
        ]}]
    })
}

fn tables() -> Value {
    json!({
        "transactions": [
            {"account_id": "A1", "transaction_date": "2023-01-05", "transaction_type": "Purchase",
             "amount": 120.0, "industry": "Supermarket"},
            {"account_id": "A1", "transaction_date": "2023-01-15", "transaction_type": "purchase",
             "amount": 80.0, "industry": "travel"},
            {"account_id": "B2", "transaction_date": "2023-01-10", "transaction_type": "refund",
             "amount": 30.0, "industry": "travel"}
        ],
        "demographics": [
            {"account_id": "A1", "age": 41, "income": 52000, "credit_limit": 4000, "sex": "F",
             "education": "Graduate", "marital_status": "Married", "account_setup": "Online"},
            {"account_id": "B2", "age": 29, "income": 31000, "credit_limit": 1500, "sex": "M",
             "education": "High School", "marital_status": "Single", "account_setup": "Branch"}
        ]
    })
}

async fn publish(app: &Router, name: &str, version: &str, extra: Value) -> (StatusCode, Value) {
    let mut body = json!({"name": name, "version": version, "model": model(2.0)});
    if let (Value::Object(body), Value::Object(extra)) = (&mut body, extra) {
        body.extend(extra);
    }
    send(app, Method::POST, "/api/v1/services", Some(body)).await
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"], 0);
}

#[tokio::test]
async fn test_publish_list_and_conflict() {
    let app = app();
    let (status, info) = publish(&app, "credit-risk", "v1", json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(info["name"], "credit-risk");
    assert_eq!(info["join"], "left_outer");

    let (status, body) = publish(&app, "credit-risk", "v1", json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "already_exists");

    let (status, list) = send(&app, Method::GET, "/api/v1/services", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], 1);
}

#[tokio::test]
async fn test_predict() {
    let app = app();
    publish(&app, "credit-risk", "v1", json!({})).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/services/credit-risk/v1/predict",
        Some(tables()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions[0]["account_id"], "A1");
    assert_eq!(predictions[0]["predicted_label"], "default");
    assert_eq!(predictions[1]["account_id"], "B2");
    assert_eq!(predictions[1]["predicted_label"], "no_default");
    let p = predictions[1]["default_probability"].as_f64().unwrap();
    assert!(p > 0.0 && p < 0.5);
}

#[tokio::test]
async fn test_inner_join_service() {
    let app = app();
    let (status, _) = publish(&app, "credit-risk", "inner", json!({"features": {"join": "inner"}})).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/services/credit-risk/inner/features",
        Some(tables()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    let row = &body["features"][0];
    assert_eq!(row["account_id"], "A1");
    assert_eq!(row["transaction_count"], 2.0);
    assert_eq!(row["total_amount"], 200.0);
    assert_eq!(row["share_travel"], 0.5);
    assert_eq!(row["education"], "graduate");
}

#[tokio::test]
async fn test_features_then_score() {
    let app = app();
    publish(&app, "credit-risk", "v1", json!({})).await;

    let (_, features) = send(
        &app,
        Method::POST,
        "/api/v1/services/credit-risk/v1/features",
        Some(tables()),
    )
    .await;
    let (status, scored) = send(
        &app,
        Method::POST,
        "/api/v1/services/credit-risk/v1/score",
        Some(json!({"features": features["features"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, predicted) = send(
        &app,
        Method::POST,
        "/api/v1/services/credit-risk/v1/predict",
        Some(tables()),
    )
    .await;
    assert_eq!(scored, predicted);
}

#[tokio::test]
async fn test_empty_input_is_not_an_error() {
    let app = app();
    publish(&app, "credit-risk", "v1", json!({})).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/services/credit-risk/v1/predict",
        Some(json!({"transactions": [], "demographics": []})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_schema_mismatch_is_unprocessable() {
    let app = app();
    publish(&app, "credit-risk", "v1", json!({})).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/services/credit-risk/v1/score",
        Some(json!({"features": [{"account_id": "A1", "transaction_count": 3.0}]})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "schema_mismatch");
}

#[tokio::test]
async fn test_malformed_record_is_unprocessable() {
    let app = app();
    publish(&app, "credit-risk", "v1", json!({})).await;

    let mut request = tables();
    request["transactions"][0]["transaction_date"] = json!("not a date");
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/services/credit-risk/v1/predict",
        Some(request),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "malformed_record");
}

#[tokio::test]
async fn test_invalid_model_rejected() {
    let app = app();
    let body = json!({
        "name": "credit-risk",
        "version": "v1",
        "model": {"schema": {"features": [{"name": "age", "kind": "numeric"}]}, "trees": []}
    });
    let (status, body) = send(&app, Method::POST, "/api/v1/services", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_model");
}

#[tokio::test]
async fn test_update_get_delete() {
    let app = app();
    let (_, published) = publish(&app, "credit-risk", "v1", json!({})).await;

    let (status, updated) = send(
        &app,
        Method::PUT,
        "/api/v1/services/credit-risk/v1",
        Some(json!({"model": model(3.0)})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], published["id"]);

    let (status, info) = send(&app, Method::GET, "/api/v1/services/credit-risk/v1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["trees"], 1);

    let (status, _) = send(&app, Method::DELETE, "/api/v1/services/credit-risk/v1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/api/v1/services/credit-risk/v1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn test_swagger_export() {
    let app = app();
    publish(&app, "credit-risk", "v1", json!({})).await;

    let (status, doc) = send(
        &app,
        Method::GET,
        "/api/v1/services/credit-risk/v1/swagger.json",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["swagger"], "2.0");
    assert!(doc["paths"]["/predict"]["post"].is_object());
    assert_eq!(
        doc["definitions"]["FeatureRow"]["properties"]["sex"]["enum"],
        json!(["f", "m"])
    );
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bootstrap_service() {
    let mut config = api::ServiceConfig::default();
    config.bootstrap = Some(api::BootstrapService {
        name: "credit-risk".to_string(),
        version: "v1".to_string(),
        model_path: std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../models/credit_risk_gbdt.json"),
    });
    let state = AppState::default();
    api::bootstrap(state.registry.as_ref(), &config).unwrap();

    let app = create_router(Arc::new(RwLock::new(state)));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/services/credit-risk/v1/predict",
        Some(tables()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
}
