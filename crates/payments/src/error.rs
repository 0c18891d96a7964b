//! Payment error types

use invopay_tenancy::{InvoiceStatus, TenancyError};
use thiserror::Error;

/// Errors crossing the adapter/reconciler boundary.
///
/// Gateway and network failures are values, not faults: callers decide the
/// user-facing messaging, and nothing here propagates as an uncaught error
/// into the HTTP layer.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The gateway answered with a non-success status. Carries the gateway's
    /// message and, when present, its structured error list.
    #[error("gateway request failed: {message}")]
    Gateway {
        message: String,
        errors: Option<serde_json::Value>,
    },

    /// The request never produced a gateway answer (DNS, TLS, timeout).
    #[error("gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Tenancy(#[from] TenancyError),

    #[error("invoice cannot be paid while {0:?}")]
    InvoiceNotPayable(InvoiceStatus),

    /// Every generated reference collided with an existing payment. With an
    /// 8-character random suffix this effectively cannot happen; surfacing
    /// it beats looping forever.
    #[error("could not generate an unused transaction reference")]
    ReferenceExhausted,

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
}

pub type PaymentResult<T> = Result<T, PaymentError>;
