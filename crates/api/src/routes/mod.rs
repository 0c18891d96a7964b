//! Route wiring.

use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::auth::require_auth;
use crate::state::AppState;

mod auth;
mod clients;
mod invoices;
mod organizations;
mod payments;
mod webhooks;

#[cfg(test)]
mod webhook_tests;

pub fn create_router(state: AppState) -> Router {
    // Everything behind require_auth runs with a TenantContext extension.
    let authed = Router::new()
        .route(
            "/organizations",
            get(organizations::list_organizations).post(organizations::create_organization),
        )
        .route(
            "/organizations/select",
            post(organizations::select_organization),
        )
        .route("/currencies", get(organizations::list_currencies))
        .route(
            "/clients",
            get(clients::list_clients).post(clients::create_client),
        )
        .route(
            "/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route("/invoices/{id}", get(invoices::get_invoice))
        .route("/invoices/{id}/pay", post(invoices::pay_invoice))
        .route("/payments", get(payments::list_payments))
        .route("/wallet/balance", get(payments::wallet_balance))
        .route("/auth/logout", post(auth::logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        // Unauthenticated by design: webhooks carry an HMAC signature, the
        // callback is a browser redirect from the gateway.
        .route("/webhooks/paychangu", post(webhooks::paychangu_webhook))
        .route("/payments/callback", get(payments::payment_callback))
        .merge(authed)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
