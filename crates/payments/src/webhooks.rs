//! Gateway webhook reconciliation.
//!
//! Consumes inbound gateway events, finds the local payment by transaction
//! reference, and transitions its status: `pending -> completed` or
//! `pending -> failed`. Conflicting repeat deliveries resolve
//! last-write-wins at row-update granularity. The same transition path backs
//! the synchronous callback verification, so the two flows cannot diverge.
//!
//! Events that cannot be correlated are discarded without error — the
//! sender is an external system whose retries we do not want — but every
//! discard is logged for operational visibility.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use invopay_tenancy::{Invoices, OrgScope, Payments};

use crate::client::GatewayPayment;
use crate::error::PaymentResult;

/// Inbound webhook body. Everything optional: malformed events are handled
/// by discarding, not by failing deserialization.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookEvent {
    pub event_type: Option<String>,
    pub tx_ref: Option<String>,
    pub status: Option<String>,
    pub reference: Option<String>,
    pub authorization: Option<WebhookAuthorization>,
    pub customer: Option<serde_json::Value>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookAuthorization {
    pub channel: Option<String>,
}

/// How the gateway's free-form status string maps onto our state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    Success,
    Failed,
    /// Anything we do not recognize: acknowledged, never acted on.
    Other,
}

pub fn classify_status(status: Option<&str>) -> GatewayStatus {
    match status.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("success") | Some("successful") => GatewayStatus::Success,
        Some("failed") => GatewayStatus::Failed,
        _ => GatewayStatus::Other,
    }
}

/// What processing an event amounted to. Used for logging and the webhook
/// acknowledgment body; none of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Completed { payment_id: i64 },
    Failed { payment_id: i64 },
    /// Event carried no transaction reference.
    MissingReference,
    /// Reference matches no local payment; nothing is fabricated.
    UnknownReference,
    /// Unrecognized status value; no mutation.
    Ignored,
}

impl WebhookOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            WebhookOutcome::Completed { .. } => "Payment completed",
            WebhookOutcome::Failed { .. } => "Payment failed",
            WebhookOutcome::MissingReference | WebhookOutcome::UnknownReference => {
                "Event discarded"
            }
            WebhookOutcome::Ignored => "Event ignored",
        }
    }
}

/// Applies gateway-reported outcomes to local payment records.
pub struct WebhookReconciler {
    pool: PgPool,
}

impl WebhookReconciler {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Process a verified webhook event.
    ///
    /// Runs with no tenant context — webhooks are unauthenticated HTTP, not
    /// user sessions — so the payment lookup uses the explicit cross-tenant
    /// scope and every mutation afterwards is pinned to the organization the
    /// payment already belongs to.
    pub async fn process_webhook(
        &self,
        event: &WebhookEvent,
        raw: &serde_json::Value,
    ) -> PaymentResult<WebhookOutcome> {
        let Some(tx_ref) = event.tx_ref.as_deref() else {
            tracing::warn!(
                event_type = event.event_type.as_deref().unwrap_or("unknown"),
                "Webhook event without a transaction reference discarded"
            );
            return Ok(WebhookOutcome::MissingReference);
        };

        let status = classify_status(event.status.as_deref());
        if status == GatewayStatus::Other {
            tracing::warn!(
                tx_ref = %tx_ref,
                status = event.status.as_deref().unwrap_or("missing"),
                "Webhook event with unrecognized status acknowledged and ignored"
            );
            return Ok(WebhookOutcome::Ignored);
        }

        let channel = event
            .authorization
            .as_ref()
            .and_then(|a| a.channel.as_deref());

        self.apply_gateway_status(
            tx_ref,
            status,
            event.reference.as_deref(),
            channel,
            event.customer.as_ref(),
            raw,
        )
        .await
    }

    /// Apply a synchronously verified gateway transaction. Used by the
    /// callback-redirect flow to resolve final status without waiting for
    /// the webhook.
    pub async fn apply_verification(
        &self,
        verified: &GatewayPayment,
    ) -> PaymentResult<WebhookOutcome> {
        let status = classify_status(Some(verified.status.as_str()));
        if status == GatewayStatus::Other {
            tracing::warn!(
                tx_ref = %verified.tx_ref,
                status = %verified.status,
                "Verification returned unrecognized status; leaving payment untouched"
            );
            return Ok(WebhookOutcome::Ignored);
        }

        let raw = serde_json::to_value(verified).unwrap_or(serde_json::Value::Null);
        let channel = verified
            .authorization
            .as_ref()
            .and_then(|a| a.channel.as_deref());

        self.apply_gateway_status(
            &verified.tx_ref,
            status,
            verified.reference.as_deref(),
            channel,
            verified.customer.as_ref(),
            &raw,
        )
        .await
    }

    async fn apply_gateway_status(
        &self,
        tx_ref: &str,
        status: GatewayStatus,
        gateway_reference: Option<&str>,
        channel: Option<&str>,
        customer: Option<&serde_json::Value>,
        raw: &serde_json::Value,
    ) -> PaymentResult<WebhookOutcome> {
        let payments = Payments::new(self.pool.clone());

        let Some(payment) = payments
            .find_by_tx_ref(&OrgScope::all_organizations(), tx_ref)
            .await?
        else {
            tracing::warn!(
                tx_ref = %tx_ref,
                "Gateway event for unknown transaction reference discarded"
            );
            return Ok(WebhookOutcome::UnknownReference);
        };

        // From here on every mutation is pinned to the payment's tenant.
        let scope = OrgScope::organization(payment.organization_id);

        match status {
            GatewayStatus::Success => {
                payments
                    .complete(&scope, payment.id, gateway_reference, channel, customer, raw)
                    .await?;

                let invoices = Invoices::new(self.pool.clone());
                invoices.mark_paid(&scope, payment.invoice_id).await?;

                tracing::info!(
                    org_id = %payment.organization_id,
                    payment_id = payment.id,
                    invoice_id = payment.invoice_id,
                    tx_ref = %tx_ref,
                    gateway_reference = gateway_reference.unwrap_or(""),
                    "Payment completed"
                );
                Ok(WebhookOutcome::Completed {
                    payment_id: payment.id,
                })
            }
            GatewayStatus::Failed => {
                payments.fail(&scope, payment.id, raw).await?;

                tracing::info!(
                    org_id = %payment.organization_id,
                    payment_id = payment.id,
                    tx_ref = %tx_ref,
                    "Payment failed"
                );
                Ok(WebhookOutcome::Failed {
                    payment_id: payment.id,
                })
            }
            // Filtered out by both callers before the lookup.
            GatewayStatus::Other => Ok(WebhookOutcome::Ignored),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lazy_pool() -> PgPool {
        // Never connects; tests that use it prove no database was touched.
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unreachable")
            .unwrap()
    }

    #[test]
    fn status_classification() {
        assert_eq!(classify_status(Some("success")), GatewayStatus::Success);
        assert_eq!(classify_status(Some("successful")), GatewayStatus::Success);
        assert_eq!(classify_status(Some("SUCCESS")), GatewayStatus::Success);
        assert_eq!(classify_status(Some(" failed ")), GatewayStatus::Failed);
        assert_eq!(classify_status(Some("processing")), GatewayStatus::Other);
        assert_eq!(classify_status(Some("")), GatewayStatus::Other);
        assert_eq!(classify_status(None), GatewayStatus::Other);
    }

    #[test]
    fn events_parse_from_the_documented_shape() {
        let event: WebhookEvent = serde_json::from_value(json!({
            "event_type": "api.charge.payment",
            "tx_ref": "INV-1-AB12CD34",
            "status": "success",
            "reference": "88837366231",
            "authorization": {"channel": "Mobile Money"},
            "customer": {"email": "client@example.com"}
        }))
        .unwrap();

        assert_eq!(event.tx_ref.as_deref(), Some("INV-1-AB12CD34"));
        assert_eq!(event.status.as_deref(), Some("success"));
        assert_eq!(
            event.authorization.unwrap().channel.as_deref(),
            Some("Mobile Money")
        );
    }

    #[test]
    fn events_tolerate_missing_fields() {
        let event: WebhookEvent = serde_json::from_value(json!({})).unwrap();
        assert!(event.tx_ref.is_none());
        assert!(event.status.is_none());

        let event: WebhookEvent =
            serde_json::from_value(json!({"unexpected": true, "status": "success"})).unwrap();
        assert!(event.tx_ref.is_none());
    }

    #[tokio::test]
    async fn missing_reference_discards_without_touching_storage() {
        let reconciler = WebhookReconciler::new(lazy_pool());
        let event: WebhookEvent =
            serde_json::from_value(json!({"status": "success"})).unwrap();

        let outcome = reconciler
            .process_webhook(&event, &json!({"status": "success"}))
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::MissingReference);
        assert_eq!(outcome.message(), "Event discarded");
    }

    #[tokio::test]
    async fn unrecognized_status_is_acknowledged_but_ignored() {
        let reconciler = WebhookReconciler::new(lazy_pool());
        let event: WebhookEvent = serde_json::from_value(json!({
            "tx_ref": "INV-1-AB12CD34",
            "status": "processing"
        }))
        .unwrap();

        let outcome = reconciler
            .process_webhook(&event, &json!({}))
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Ignored);
        assert_eq!(outcome.message(), "Event ignored");
    }
}
