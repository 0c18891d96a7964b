//! API error type and HTTP mapping.
//!
//! Every lower-layer error becomes a status code here; nothing propagates
//! into axum as an uncaught fault.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use invopay_payments::PaymentError;
use invopay_tenancy::TenancyError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,

    #[error("insufficient permissions")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("internal error")]
    Internal,

    #[error(transparent)]
    Tenancy(#[from] TenancyError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string(), None),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, self.to_string(), None),
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string(), None),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone(), None),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None),

            ApiError::Tenancy(TenancyError::NoOrganizationSelected)
            | ApiError::Tenancy(TenancyError::MissingOrganizationId) => {
                (StatusCode::BAD_REQUEST, self.to_string(), None)
            }
            ApiError::Tenancy(TenancyError::NotAMember) => {
                (StatusCode::FORBIDDEN, self.to_string(), None)
            }
            ApiError::Tenancy(TenancyError::Database(e)) => {
                tracing::error!(error = %e, "Database error reached the HTTP boundary");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                    None,
                )
            }

            ApiError::Payment(PaymentError::Gateway { message, errors }) => (
                StatusCode::BAD_GATEWAY,
                message.clone(),
                errors.clone(),
            ),
            ApiError::Payment(PaymentError::Transport(e)) => {
                tracing::error!(error = %e, "Payment gateway unreachable");
                (
                    StatusCode::BAD_GATEWAY,
                    "payment gateway unreachable".to_string(),
                    None,
                )
            }
            ApiError::Payment(PaymentError::InvoiceNotPayable(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string(), None)
            }
            ApiError::Payment(e) => {
                tracing::error!(error = %e, "Payment error reached the HTTP boundary");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                    None,
                )
            }

            ApiError::Database(e) => {
                tracing::error!(error = %e, "Database error reached the HTTP boundary");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                    None,
                )
            }
        };

        let body = match errors {
            Some(errors) => json!({ "message": message, "errors": errors }),
            None => json!({ "message": message }),
        };

        (status, Json(body)).into_response()
    }
}
