//! Signature workflow and lifecycle transitions through the HTTP API.

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
        max_uplift_p_per_kwh: None,
        default_uplift_p_per_kwh: None,
        http_timeout_secs: 1,
    }
}

async fn setup_test_app(provider: MockSignatureProvider) -> TestApp {
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
        Arc::new(provider),
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

async fn create_contract(app: &axum::Router, with_template: bool) {
    let mut body = json!({
        "reference": "CT-0001",
        "customer": "Holt & Sons",
        "supplier": "Acme Energy",
        "contract_type": "electricity",
    });
    if with_template {
        body["sign_template"] = json!("contract-template");
    }
    let (status, _) = request(app, "POST", "/v1/contracts", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn send_and_complete_signature_confirms_contract() {
    let provider = MockSignatureProvider::new()
        .with_next_ref("sig-1")
        .with_status("sig-1", "completed")
        .with_pdf("sig-1", "doc-9.pdf");
    let test = setup_test_app(provider).await;
    create_contract(&test.app, true).await;

    let (status, body) = request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/send-for-signature",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "sent");
    assert_eq!(body["request_ref"], "sig-1");

    let (_, sync) = request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/sync-signature",
        None,
    )
    .await;
    assert_eq!(sync["changed"], true);

    let (_, contract) = request(&test.app, "GET", "/v1/contracts/CT-0001", None).await;
    assert_eq!(contract["status"], "confirmed");
    assert_eq!(contract["sign"]["status"], "signed");
    assert_eq!(contract["sign"]["executed_document"], "doc-9.pdf");
    assert!(contract["sign"]["completed_on"].is_string());
}

#[tokio::test]
async fn repeated_sync_is_idempotent() {
    let provider = MockSignatureProvider::new()
        .with_next_ref("sig-1")
        .with_status("sig-1", "completed");
    let test = setup_test_app(provider).await;
    create_contract(&test.app, true).await;

    request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/send-for-signature",
        None,
    )
    .await;
    request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/sync-signature",
        None,
    )
    .await;
    let (_, first) = request(&test.app, "GET", "/v1/contracts/CT-0001", None).await;

    let (_, second_sync) = request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/sync-signature",
        None,
    )
    .await;
    assert_eq!(second_sync["changed"], false);

    let (_, second) = request(&test.app, "GET", "/v1/contracts/CT-0001", None).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn late_completion_does_not_regress_live_contract() {
    let provider = MockSignatureProvider::new()
        .with_next_ref("sig-1")
        .with_status("sig-1", "completed");
    let test = setup_test_app(provider).await;
    create_contract(&test.app, true).await;

    request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/send-for-signature",
        None,
    )
    .await;

    // The contract goes live before the completion callback lands.
    let (status, _) = request(
        &test.app,
        "PUT",
        "/v1/contracts/CT-0001/status",
        Some(json!({"status": "live"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/sync-signature",
        None,
    )
    .await;

    let (_, contract) = request(&test.app, "GET", "/v1/contracts/CT-0001", None).await;
    assert_eq!(contract["status"], "live");
    assert_eq!(contract["sign"]["status"], "signed");
}

#[tokio::test]
async fn refusal_routes_contract_to_query() {
    let provider = MockSignatureProvider::new()
        .with_next_ref("sig-1")
        .with_status("sig-1", "rejected");
    let test = setup_test_app(provider).await;
    create_contract(&test.app, true).await;

    request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/send-for-signature",
        None,
    )
    .await;
    request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/sync-signature",
        None,
    )
    .await;

    let (_, contract) = request(&test.app, "GET", "/v1/contracts/CT-0001", None).await;
    assert_eq!(contract["status"], "query");
    assert_eq!(contract["sign"]["status"], "refused");
}

#[tokio::test]
async fn signing_step_cancellation_leaves_lifecycle_alone() {
    let provider = MockSignatureProvider::new()
        .with_next_ref("sig-1")
        .with_status("sig-1", "cancelled");
    let test = setup_test_app(provider).await;
    create_contract(&test.app, true).await;

    request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/send-for-signature",
        None,
    )
    .await;
    request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/sync-signature",
        None,
    )
    .await;

    let (_, contract) = request(&test.app, "GET", "/v1/contracts/CT-0001", None).await;
    assert_eq!(contract["status"], "draft");
    assert_eq!(contract["sign"]["status"], "cancelled");
}

#[tokio::test]
async fn send_without_template_reports_missing_prerequisites() {
    let test = setup_test_app(MockSignatureProvider::new()).await;
    create_contract(&test.app, false).await;

    let (status, body) = request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/send-for-signature",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "missing_prerequisites");

    let (_, contract) = request(&test.app, "GET", "/v1/contracts/CT-0001", None).await;
    assert!(contract["sign"]["request_ref"].is_null());
}

#[tokio::test]
async fn illegal_manual_transitions_are_rejected() {
    let test = setup_test_app(MockSignatureProvider::new()).await;
    create_contract(&test.app, false).await;

    // Forward moves are fine.
    let (status, _) = request(
        &test.app,
        "PUT",
        "/v1/contracts/CT-0001/status",
        Some(json!({"status": "sale_agreed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Backwards is not.
    let (status, error) = request(
        &test.app,
        "PUT",
        "/v1/contracts/CT-0001/status",
        Some(json!({"status": "draft"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(error["error"].as_str().unwrap().contains("illegal transition"));

    // Terminal states have no exits.
    request(
        &test.app,
        "PUT",
        "/v1/contracts/CT-0001/status",
        Some(json!({"status": "cancelled"})),
    )
    .await;
    let (status, _) = request(
        &test.app,
        "PUT",
        "/v1/contracts/CT-0001/status",
        Some(json!({"status": "live"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn sync_all_covers_every_open_request() {
    let provider = MockSignatureProvider::new()
        .with_next_ref("sig-1")
        .with_status("sig-1", "completed");
    let test = setup_test_app(provider).await;
    create_contract(&test.app, true).await;

    request(
        &test.app,
        "POST",
        "/v1/contracts/CT-0001/send-for-signature",
        None,
    )
    .await;

    let (status, body) = request(&test.app, "POST", "/v1/contracts/sync-signatures", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checked"], 1);
    assert_eq!(body["changed"], 1);
}
