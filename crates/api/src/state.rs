//! Application state

use std::sync::Arc;

use sqlx::PgPool;

use invopay_payments::PaymentService;
use invopay_tenancy::SessionStore;

use crate::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    /// In-process session store; the tenant context lives here, never in
    /// the database schema.
    pub sessions: SessionStore,
    pub payments: Arc<PaymentService>,
}

impl AppState {
    /// Build state with the payment service configured from the
    /// environment.
    pub fn from_env(pool: PgPool, config: Config) -> anyhow::Result<Self> {
        let payments = PaymentService::from_env(pool.clone())?;
        tracing::info!("PayChangu payment service initialized");
        Ok(Self::new(pool, config, payments))
    }

    /// Build state with an explicitly configured payment service.
    pub fn new(pool: PgPool, config: Config, payments: PaymentService) -> Self {
        Self {
            pool,
            config,
            sessions: SessionStore::new(),
            payments: Arc::new(payments),
        }
    }
}
