//! Payment listing, wallet balance, and the checkout callback redirect.

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::{Extension, Json};
use serde::Deserialize;

use invopay_payments::{classify_status, PaymentMeta, WalletBalance, WebhookOutcome};
use invopay_tenancy::{OrgScope, Payment, Payments, TenantContext};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BalanceParams {
    pub currency: String,
}

/// Query parameters the gateway appends to the callback redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub tx_ref: Option<String>,
    #[allow(dead_code)] // informational; the verify call is authoritative
    pub status: Option<String>,
}

pub async fn list_payments(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Json<Vec<Payment>>> {
    let scope = OrgScope::current(&ctx)?;
    let payments = Payments::new(state.pool.clone());
    Ok(Json(payments.list(&scope).await?))
}

pub async fn wallet_balance(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(params): Query<BalanceParams>,
) -> ApiResult<Json<Option<WalletBalance>>> {
    let membership = ctx
        .current_membership(&state.pool)
        .await?
        .ok_or(ApiError::Forbidden)?;
    if !membership.role.can_manage_billing() {
        return Err(ApiError::Forbidden);
    }

    let balance = state.payments.client.wallet_balance(&params.currency).await?;
    Ok(Json(balance))
}

/// Browser return leg of a checkout session.
///
/// Verifies the transaction synchronously at the gateway — the webhook may
/// not have arrived yet — applies the result through the same transition
/// path the reconciler uses, and redirects into the dashboard. Errors here
/// never surface to the browser as anything but an error flash.
pub async fn payment_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let dashboard = state.config.dashboard_url.clone();
    let error_target = format!("{dashboard}/dashboard?payment=error");

    let Some(tx_ref) = params.tx_ref.filter(|s| !s.is_empty()) else {
        tracing::warn!("Payment callback without a transaction reference");
        return Redirect::to(&error_target);
    };

    let verified = match state.payments.client.verify(&tx_ref).await {
        Ok(verified) => verified,
        Err(e) => {
            tracing::warn!(tx_ref = %tx_ref, error = %e, "Payment verification failed");
            return Redirect::to(&error_target);
        }
    };

    let outcome = match state.payments.webhooks.apply_verification(&verified).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(tx_ref = %tx_ref, error = %e, "Failed to apply verified payment");
            return Redirect::to(&error_target);
        }
    };

    // Invoice id comes from the correlation meta we embedded at initiation;
    // the local payment row is the fallback when the gateway drops it.
    let invoice_id = match verified.meta.as_ref().and_then(PaymentMeta::from_value) {
        Some(meta) => Some(meta.invoice_id),
        None => {
            let payments = Payments::new(state.pool.clone());
            payments
                .find_by_tx_ref(&OrgScope::all_organizations(), &tx_ref)
                .await
                .ok()
                .flatten()
                .map(|p| p.invoice_id)
        }
    };

    match (outcome, invoice_id) {
        (WebhookOutcome::Completed { .. }, Some(id)) => {
            Redirect::to(&format!("{dashboard}/invoices/{id}?payment=success"))
        }
        (WebhookOutcome::Failed { .. }, Some(id)) => {
            Redirect::to(&format!("{dashboard}/invoices/{id}?payment=failed"))
        }
        _ => {
            tracing::warn!(
                tx_ref = %tx_ref,
                gateway_status = ?classify_status(Some(verified.status.as_str())),
                resolved_invoice = ?invoice_id,
                "Callback could not be resolved to an invoice"
            );
            Redirect::to(&error_target)
        }
    }
}
