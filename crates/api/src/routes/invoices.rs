//! Invoice endpoints, including payment initiation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use invopay_payments::{Checkout, CustomerDetails};
use invopay_tenancy::{
    Clients, Currencies, Invoice, Invoices, NewInvoice, OrgScope, TenantContext,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub client_id: i64,
    /// Defaults to the organization's default currency.
    pub currency: Option<String>,
    pub total_cents: i64,
    pub notes: Option<String>,
    pub due_date: Option<time::Date>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PayInvoiceRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Json<Vec<Invoice>>> {
    let scope = OrgScope::current(&ctx)?;
    let invoices = Invoices::new(state.pool.clone());
    Ok(Json(invoices.list(&scope).await?))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Invoice>> {
    let scope = OrgScope::current(&ctx)?;
    let invoices = Invoices::new(state.pool.clone());
    let invoice = invoices.find(&scope, id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(invoice))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(req): Json<CreateInvoiceRequest>,
) -> ApiResult<(StatusCode, Json<Invoice>)> {
    let scope = OrgScope::current(&ctx)?;

    if req.total_cents <= 0 {
        return Err(ApiError::BadRequest(
            "invoice total must be positive".to_string(),
        ));
    }

    // The client must be visible under the same scope; a client id from
    // another organization is indistinguishable from a nonexistent one.
    let clients = Clients::new(state.pool.clone());
    if clients.find(&scope, req.client_id).await?.is_none() {
        return Err(ApiError::BadRequest(
            "client not found in this organization".to_string(),
        ));
    }

    let currency = match req.currency {
        Some(code) => code,
        None => {
            let currencies = Currencies::new(state.pool.clone());
            currencies
                .find_default(&scope)
                .await?
                .map(|c| c.code)
                .ok_or_else(|| {
                    ApiError::BadRequest(
                        "no currency given and the organization has no default".to_string(),
                    )
                })?
        }
    };

    let invoices = Invoices::new(state.pool.clone());
    let invoice = invoices
        .create(
            &scope,
            NewInvoice {
                client_id: req.client_id,
                currency,
                total_cents: req.total_cents,
                notes: req.notes,
                due_date: req.due_date,
                organization_id: None, // stamped by the scope
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(invoice)))
}

/// Start a gateway checkout for an invoice. Returns the hosted checkout URL
/// and the generated transaction reference.
pub async fn pay_invoice(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
    Json(req): Json<PayInvoiceRequest>,
) -> ApiResult<Json<Checkout>> {
    let scope = OrgScope::current(&ctx)?;

    let membership = ctx
        .current_membership(&state.pool)
        .await?
        .ok_or(ApiError::Forbidden)?;
    if !membership.role.can_manage_billing() {
        return Err(ApiError::Forbidden);
    }

    let invoices = Invoices::new(state.pool.clone());
    let invoice = invoices.find(&scope, id).await?.ok_or(ApiError::NotFound)?;

    let customer = CustomerDetails {
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
    };

    let checkout = state
        .payments
        .checkout
        .initiate_payment(&scope, &invoice, &customer)
        .await?;

    Ok(Json(checkout))
}
