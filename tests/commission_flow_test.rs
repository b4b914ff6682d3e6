//! End-to-end commission derivation through the HTTP API: contract
//! creation, rule changes, reconciliation appends and recomputation.

use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;
use wattbroker::api::{self, AppState};
use wattbroker::config::Config;
use wattbroker::datasource::{MockPricingApi, MockSignatureProvider};
use wattbroker::db::init_db;
use wattbroker::Repository;

struct TestApp {
    app: axum::Router,
    _temp: TempDir,
}

fn test_config(db_path: String) -> Config {
    Config {
        port: 0,
        database_path: db_path,
        pricing_api_url: "http://example.invalid".to_string(),
        pricing_api_key: "pk-test".to_string(),
        sign_api_url: "http://example.invalid".to_string(),
        sign_api_key: "sk-test".to_string(),
        max_uplift_p_per_kwh: Some(wattbroker::Decimal::from_i64(5)),
        default_uplift_p_per_kwh: None,
        http_timeout_secs: 1,
    }
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");

    let repo = Arc::new(Repository::new(pool));
    let state = AppState::new(
        repo,
        test_config(db_path),
        Arc::new(MockPricingApi::new()),
        Arc::new(MockSignatureProvider::new()),
    );

    TestApp {
        app: api::create_router(state),
        _temp: temp_dir,
    }
}

async fn request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            axum::body::Body::from(json.to_string())
        }
        None => axum::body::Body::empty(),
    };
    let req = builder.body(body).unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn create_contract_body() -> Value {
    json!({
        "reference": "CT-0001",
        "customer": "Holt & Sons",
        "supplier": "Acme Energy",
        "contract_type": "electricity",
        "unit_rate_p_per_kwh": 10.5,
        "standing_charge_gbp_per_day": 0.45,
        "total_usage_kwh": 50000,
        "uplift_p_per_kwh": 2,
    })
}

#[tokio::test]
async fn contract_creation_derives_initial_figures() {
    let test = setup_test_app().await;

    let (status, body) = request(
        &test.app,
        "POST",
        "/v1/contracts",
        Some(create_contract_body()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // No rule, no ledger: the full uplift value passes through.
    assert_eq!(body["figures"]["supplier_commission"], 1000.0);
    assert_eq!(body["figures"]["full_commission"], 1000.0);
    assert_eq!(body["figures"]["commission_first_payment"], 0.0);
    assert_eq!(body["figures"]["commission_amount_total"], 1000.0);
    assert_eq!(body["status"], "draft");
}

#[tokio::test]
async fn uplift_above_maximum_is_rejected_at_creation() {
    let test = setup_test_app().await;

    let mut body = create_contract_body();
    body["uplift_p_per_kwh"] = json!(6);
    let (status, error) = request(&test.app, "POST", "/v1/contracts", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(error["error"]
        .as_str()
        .unwrap()
        .contains("uplift exceeds maximum"));
}

#[tokio::test]
async fn rule_and_ledger_flow_updates_figures() {
    let test = setup_test_app().await;
    request(
        &test.app,
        "POST",
        "/v1/contracts",
        Some(create_contract_body()),
    )
    .await;

    // Attach the 50/80/25 rule: 1000 -> 500 -> 400 -> 100 upfront.
    let (status, figures) = request(
        &test.app,
        "PUT",
        "/v1/contracts/CT-0001/rule",
        Some(json!({
            "rule": {
                "name": "Acme 3yr",
                "supplier": "Acme Energy",
                "year_duration": 3,
                "supplier_percent": 50,
                "broker_split_percent": 80,
                "upfront_percent": 25,
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(figures["supplier_commission"], "500");
    assert_eq!(figures["full_commission"], "400");
    assert_eq!(figures["commission_first_payment"], "100");
    assert_eq!(figures["commission_amount_total"], "400");

    // Broker has been paid 450: 500 - 100 - 450 = -50, not clamped.
    let (status, result) = request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/reconciliation",
        Some(json!({"side": "broker", "date": "2026-02-01", "amount": 450})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["inserted"], true);
    assert_eq!(result["figures"]["commission_to_pay"], "-50");

    // Supplier remitted 300: amount_total now tracks the ledger.
    let (_, result) = request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/reconciliation",
        Some(json!({"side": "supplier", "date": "2026-03-01", "amount": 300})),
    )
    .await;
    assert_eq!(result["figures"]["commission_amount_total"], "300");
}

#[tokio::test]
async fn duplicate_reconciliation_append_changes_nothing() {
    let test = setup_test_app().await;
    request(
        &test.app,
        "POST",
        "/v1/contracts",
        Some(create_contract_body()),
    )
    .await;

    let body = json!({"side": "supplier", "date": "2026-03-01", "amount": 250, "note": "Q1"});
    let (_, first) = request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/reconciliation",
        Some(body.clone()),
    )
    .await;
    assert_eq!(first["inserted"], true);

    let (_, second) = request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/reconciliation",
        Some(body),
    )
    .await;
    assert_eq!(second["inserted"], false);
    assert_eq!(second["figures"], first["figures"]);
}

#[tokio::test]
async fn out_of_range_rule_is_a_validation_error() {
    let test = setup_test_app().await;
    request(
        &test.app,
        "POST",
        "/v1/contracts",
        Some(create_contract_body()),
    )
    .await;

    let (status, error) = request(
        &test.app,
        "PUT",
        "/v1/contracts/CT-0001/rule",
        Some(json!({
            "rule": {
                "name": "broken",
                "supplier": "Acme Energy",
                "year_duration": 1,
                "supplier_percent": 150,
                "broker_split_percent": 80,
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(error["error"].as_str().unwrap().contains("between 0 and 100"));
}

#[tokio::test]
async fn rederivation_with_unchanged_inputs_is_identical() {
    let test = setup_test_app().await;
    request(
        &test.app,
        "POST",
        "/v1/contracts",
        Some(create_contract_body()),
    )
    .await;
    request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/reconciliation",
        Some(json!({"side": "supplier", "date": "2026-03-01", "amount": 123.456})),
    )
    .await;

    let (_, first) = request(&test.app, "GET", "/v1/contracts/CT-0001", None).await;
    let (_, second) = request(&test.app, "GET", "/v1/contracts/CT-0001", None).await;
    assert_eq!(first, second);
    assert_eq!(first["figures"]["commission_amount_total"], 123.456);
}

#[tokio::test]
async fn unknown_contract_is_not_found() {
    let test = setup_test_app().await;
    let (status, _) = request(&test.app, "GET", "/v1/contracts/CT-9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(
        &test.app,
        "PUT",
        "/v1/contracts/CT-9999/uplift",
        Some(json!({"uplift_p_per_kwh": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
