//! Server configuration

use anyhow::Context;

/// Server configuration loaded from the environment.
///
/// Gateway credentials and checkout URLs are read separately by the
/// payments crate (`PayChanguConfig::from_env`, `PaymentUrls::from_env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    /// Base URL of the frontend; callback redirects land under it.
    pub dashboard_url: String,
    /// Comma-separated CORS origin allowlist.
    pub allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let dashboard_url = std::env::var("DASHBOARD_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

        Ok(Self {
            database_url,
            bind_address,
            dashboard_url,
            allowed_origins,
        })
    }
}
