//! Boundary tests for the webhook endpoint and callback redirect.
//!
//! These run against the real router with a lazy pool that never connects:
//! any path that accidentally touches storage fails the test instead of
//! silently depending on a database.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use invopay_payments::{PayChanguConfig, PaymentService, PaymentUrls};

use crate::config::Config;
use crate::routes::create_router;
use crate::state::AppState;

const WEBHOOK_SECRET: &str = "whsec-test-secret";
const DASHBOARD_URL: &str = "http://dash.test";

fn lazy_pool() -> sqlx::PgPool {
    sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unreachable")
        .unwrap()
}

fn test_state(gateway_base_url: String) -> AppState {
    let config = Config {
        database_url: "postgres://localhost/unreachable".to_string(),
        bind_address: "127.0.0.1:0".to_string(),
        dashboard_url: DASHBOARD_URL.to_string(),
        allowed_origins: String::new(),
    };
    let payments = PaymentService::new(
        PayChanguConfig {
            secret_key: "sec-test-key".to_string(),
            webhook_secret: WEBHOOK_SECRET.to_string(),
            base_url: gateway_base_url,
        },
        PaymentUrls {
            callback_url: "http://localhost:8080/payments/callback".to_string(),
            return_url: "http://localhost:3000/invoices".to_string(),
        },
        lazy_pool(),
    );
    AppState::new(lazy_pool(), config, payments)
}

fn sign(body: &[u8]) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn webhook_request(body: Vec<u8>, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/paychangu")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("Signature", signature);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn response_message(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    value["message"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn webhook_with_invalid_signature_is_rejected() {
    let app = create_router(test_state("http://localhost:1".to_string()));
    let body = json!({"tx_ref": "INV-1-AB12CD34", "status": "success"}).to_string();

    let response = app
        .oneshot(webhook_request(body.into_bytes(), Some("deadbeef")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response_message(response).await, "Invalid signature");
}

#[tokio::test]
async fn webhook_without_signature_header_is_rejected() {
    let app = create_router(test_state("http://localhost:1".to_string()));
    let body = json!({"tx_ref": "INV-1-AB12CD34", "status": "success"}).to_string();

    let response = app
        .oneshot(webhook_request(body.into_bytes(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_without_reference_is_acknowledged_and_discarded() {
    let app = create_router(test_state("http://localhost:1".to_string()));
    let body = json!({"event_type": "api.charge.payment", "status": "success"}).to_string();
    let signature = sign(body.as_bytes());

    let response = app
        .oneshot(webhook_request(body.into_bytes(), Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_message(response).await, "Event discarded");
}

#[tokio::test]
async fn webhook_with_unrecognized_status_is_acknowledged_and_ignored() {
    let app = create_router(test_state("http://localhost:1".to_string()));
    let body = json!({"tx_ref": "INV-1-AB12CD34", "status": "processing"}).to_string();
    let signature = sign(body.as_bytes());

    let response = app
        .oneshot(webhook_request(body.into_bytes(), Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_message(response).await, "Event ignored");
}

#[tokio::test]
async fn webhook_with_unparseable_body_is_acknowledged() {
    let app = create_router(test_state("http://localhost:1".to_string()));
    let body = b"not json at all".to_vec();
    let signature = sign(&body);

    let response = app
        .oneshot(webhook_request(body, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_message(response).await, "Event discarded");
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = create_router(test_state("http://localhost:1".to_string()));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/invoices")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn callback_without_reference_redirects_with_error_flash() {
    let app = create_router(test_state("http://localhost:1".to_string()));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/payments/callback")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()["location"].to_str().unwrap();
    assert_eq!(location, format!("{DASHBOARD_URL}/dashboard?payment=error"));
}

#[tokio::test]
async fn callback_with_failed_verification_redirects_with_error_flash() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/verify-payment/INV-9-ZZ99ZZ99")
        .with_status(400)
        .with_body(
            json!({"status": "failed", "message": "Transaction not found"}).to_string(),
        )
        .create_async()
        .await;

    let app = create_router(test_state(server.url()));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/payments/callback?tx_ref=INV-9-ZZ99ZZ99&status=success")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()["location"].to_str().unwrap();
    assert_eq!(location, format!("{DASHBOARD_URL}/dashboard?payment=error"));
}
