// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Invopay Payments Module
//!
//! Handles the PayChangu integration: hosted checkout initiation,
//! synchronous verification, wallet balance, and webhook reconciliation.
//!
//! ## Features
//!
//! - **Checkout**: turn an invoice into a hosted checkout session with a
//!   locally generated transaction reference and a `pending` payment row
//! - **Webhooks**: authenticate inbound events (HMAC-SHA256 over the raw
//!   body) and transition payment status
//! - **Verification**: resolve final status synchronously on the callback
//!   redirect, through the same transition path as webhooks
//! - **Wallet**: read-only balance passthrough

pub mod checkout;
pub mod client;
pub mod error;
pub mod webhooks;

#[cfg(test)]
mod edge_case_tests;

// Checkout
pub use checkout::{Checkout, CheckoutService, CustomerDetails, PaymentUrls};

// Client
pub use client::{
    GatewayAuthorization, GatewayPayment, InitiateData, InitiateRequest, PayChanguClient,
    PayChanguConfig, PaymentMeta, WalletBalance,
};

// Error
pub use error::{PaymentError, PaymentResult};

// Webhooks
pub use webhooks::{
    classify_status, GatewayStatus, WebhookAuthorization, WebhookEvent, WebhookOutcome,
    WebhookReconciler,
};

use sqlx::PgPool;

/// Main payment service that combines all payment functionality
pub struct PaymentService {
    pub client: PayChanguClient,
    pub checkout: CheckoutService,
    pub webhooks: WebhookReconciler,
}

impl PaymentService {
    /// Create a new payment service from environment variables
    pub fn from_env(pool: PgPool) -> PaymentResult<Self> {
        let config = PayChanguConfig::from_env()?;
        Ok(Self::new(config, PaymentUrls::from_env(), pool))
    }

    /// Create a new payment service with explicit config
    pub fn new(config: PayChanguConfig, urls: PaymentUrls, pool: PgPool) -> Self {
        let client = PayChanguClient::new(config);
        Self {
            checkout: CheckoutService::new(client.clone(), pool.clone(), urls),
            webhooks: WebhookReconciler::new(pool),
            client,
        }
    }
}
