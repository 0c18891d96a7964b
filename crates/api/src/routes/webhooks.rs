//! PayChangu webhook endpoint.
//!
//! Signature verification runs over the exact raw body bytes before any
//! parsing. An invalid signature is the only non-200 answer; everything
//! after authentication — malformed bodies, unknown references, even
//! internal processing errors — is acknowledged with 200 so the gateway
//! does not go into a retry storm. Internal errors are logged, not
//! surfaced.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use invopay_payments::WebhookEvent;

use crate::state::AppState;

const SIGNATURE_HEADER: &str = "Signature";

pub async fn paychangu_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !state
        .payments
        .client
        .verify_webhook_signature(&body, signature)
    {
        tracing::warn!(
            body_len = body.len(),
            has_signature = !signature.is_empty(),
            "Webhook rejected: invalid signature"
        );
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid signature" })),
        )
            .into_response();
    }

    let raw: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "Webhook body is not valid JSON; discarding");
            return acknowledge("Event discarded");
        }
    };

    // Unparseable shapes degrade to an empty event, which the reconciler
    // discards as reference-less.
    let event: WebhookEvent = serde_json::from_value(raw.clone()).unwrap_or_default();

    match state.payments.webhooks.process_webhook(&event, &raw).await {
        Ok(outcome) => acknowledge(outcome.message()),
        Err(e) => {
            tracing::error!(
                error = %e,
                tx_ref = event.tx_ref.as_deref().unwrap_or(""),
                "Webhook processing failed; acknowledging to suppress gateway retries"
            );
            acknowledge("Webhook received")
        }
    }
}

fn acknowledge(message: &str) -> Response {
    (StatusCode::OK, Json(json!({ "message": message }))).into_response()
}
