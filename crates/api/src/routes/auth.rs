//! Registration, login, logout.
//!
//! Deliberately minimal — sessions exist so that org-selection has
//! somewhere to live. Anything fancier (refresh, MFA, lockout) is out of
//! scope.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use invopay_tenancy::{TenancyError, TenantContext, Users};

use crate::auth::password;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub user_id: Uuid,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("invalid email address".to_string()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let hash = password::hash_password(&req.password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        ApiError::Internal
    })?;

    let users = Users::new(state.pool.clone());
    match users.create(&req.email, &hash, &req.name).await {
        Ok(user) => Ok((
            StatusCode::CREATED,
            Json(json!({ "user_id": user.id, "email": user.email })),
        )),
        Err(TenancyError::Database(e)) if is_unique_violation(&e) => Err(ApiError::BadRequest(
            "email is already registered".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let users = Users::new(state.pool.clone());
    let user = users.find_by_email(&req.email).await?;

    // Same rejection for unknown email and wrong password.
    let Some(user) = user.filter(|u| password::verify_password(&req.password, &u.password_hash))
    else {
        return Err(ApiError::Unauthorized);
    };

    let token = state.sessions.issue(user.id).await;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Json<serde_json::Value>> {
    state.sessions.revoke(ctx.session_id()).await;
    Ok(Json(json!({ "message": "Logged out" })))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
