//! Authentication middleware for Axum
//!
//! Resolves the bearer session token into a [`TenantContext`] and makes
//! sure a current organization is selected before any handler runs. The
//! context rides on request extensions; handlers take it with
//! `Extension<TenantContext>` — there is no ambient current-organization
//! global anywhere.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use invopay_tenancy::TenantContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Extract the session token from the Authorization header.
fn extract_bearer_token(request: &Request) -> Option<Uuid> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .and_then(|token| token.trim().parse().ok())
}

/// Middleware that requires an authenticated session.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let Some(token) = extract_bearer_token(&request) else {
        tracing::warn!(path = %path, "require_auth: no bearer token");
        return ApiError::Unauthorized.into_response();
    };

    let Some(mut ctx) = TenantContext::load(&state.sessions, token).await else {
        tracing::warn!(path = %path, "require_auth: unknown or expired session");
        return ApiError::Unauthorized.into_response();
    };

    // First request after login lands here with no organization selected;
    // pick the user's earliest active membership deterministically.
    if let Err(e) = ctx.ensure_organization(&state.pool).await {
        tracing::error!(path = %path, error = %e, "require_auth: failed to resolve organization");
        return ApiError::from(e).into_response();
    }

    tracing::debug!(
        path = %path,
        user_id = %ctx.user_id(),
        org_id = ?ctx.current_organization_id(),
        "require_auth: authenticated"
    );

    request.extensions_mut().insert(ctx);
    next.run(request).await
}
