//! Organization listing, onboarding, and selection.
//!
//! Selection is the one piece of session mechanics in scope: it validates
//! the caller's membership and stores the choice in the session, which is
//! what the scope filter keys on for every subsequent request.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use invopay_tenancy::{
    Currencies, Currency, Membership, Memberships, NewOrganization, OrgScope, Organization,
    Organizations, TenantContext,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub slug: Option<String>,
    pub billing_email: Option<String>,
    pub billing_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectOrganizationRequest {
    pub organization_id: Uuid,
}

pub async fn list_organizations(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Json<Vec<Organization>>> {
    let organizations = Organizations::new(state.pool.clone());
    Ok(Json(organizations.list_for_user(ctx.user_id()).await?))
}

pub async fn create_organization(
    State(state): State<AppState>,
    Extension(mut ctx): Extension<TenantContext>,
    Json(req): Json<CreateOrganizationRequest>,
) -> ApiResult<(StatusCode, Json<Organization>)> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "organization name must not be empty".to_string(),
        ));
    }

    let organizations = Organizations::new(state.pool.clone());
    let organization = organizations
        .create(
            NewOrganization {
                name: req.name,
                slug: req.slug,
                billing_email: req.billing_email,
                billing_address: req.billing_address,
            },
            ctx.user_id(),
        )
        .await?;

    // A user's first organization becomes their current one immediately.
    if ctx.current_organization_id().is_none() {
        ctx.set_current_organization(Some(organization.id)).await;
    }

    Ok((StatusCode::CREATED, Json(organization)))
}

pub async fn select_organization(
    State(state): State<AppState>,
    Extension(mut ctx): Extension<TenantContext>,
    Json(req): Json<SelectOrganizationRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let membership = active_membership(&state, &ctx, req.organization_id).await?;

    let organizations = Organizations::new(state.pool.clone());
    match organizations.find(req.organization_id).await? {
        Some(org) if org.active => {}
        _ => return Err(ApiError::NotFound),
    }

    ctx.set_current_organization(Some(req.organization_id))
        .await;

    tracing::info!(
        user_id = %ctx.user_id(),
        org_id = %req.organization_id,
        role = ?membership.role,
        "Switched current organization"
    );

    Ok(Json(json!({
        "message": "Organization selected",
        "organization_id": req.organization_id,
    })))
}

/// Currencies the current organization invoices in.
pub async fn list_currencies(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Json<Vec<Currency>>> {
    let scope = OrgScope::current(&ctx)?;
    let currencies = Currencies::new(state.pool.clone());
    Ok(Json(currencies.list(&scope).await?))
}

/// The caller's active membership in an organization, or 403.
async fn active_membership(
    state: &AppState,
    ctx: &TenantContext,
    organization_id: Uuid,
) -> ApiResult<Membership> {
    let memberships = Memberships::new(state.pool.clone());
    memberships
        .find_for_user(organization_id, ctx.user_id())
        .await?
        .ok_or(ApiError::Forbidden)
}
