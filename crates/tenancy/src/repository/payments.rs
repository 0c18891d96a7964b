//! Payment repository. Tenant-owned; also consumed by the webhook
//! reconciler, which runs without a session and therefore reaches for the
//! named bypass scopes explicitly.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::TenancyResult;
use crate::models::{Payment, PaymentStatus};
use crate::scope::OrgScope;

pub struct NewPayment {
    pub invoice_id: i64,
    pub amount_cents: i64,
    pub currency: String,
    pub tx_ref: String,
    /// Raw gateway response from initiation, kept for audit.
    pub gateway_payload: Option<serde_json::Value>,
    /// Explicit organization; when `None` the scope stamps it.
    pub organization_id: Option<Uuid>,
}

pub struct Payments {
    pool: PgPool,
}

const PAYMENT_COLUMNS: &str = "id, invoice_id, organization_id, amount_cents, currency, tx_ref, \
     gateway, status, gateway_reference, channel, customer, gateway_payload, completed_at, \
     failed_at, created_at, updated_at";

impl Payments {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new payment in `pending` status. The transaction reference
    /// is stamped here once and never changes.
    pub async fn create_pending(&self, scope: &OrgScope, new: NewPayment) -> TenancyResult<Payment> {
        let organization_id = scope.stamp(new.organization_id)?;

        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (invoice_id, organization_id, amount_cents, currency, tx_ref,
                                  status, gateway_payload)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(new.invoice_id)
        .bind(organization_id)
        .bind(new.amount_cents)
        .bind(&new.currency)
        .bind(&new.tx_ref)
        .bind(PaymentStatus::Pending)
        .bind(&new.gateway_payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    pub async fn list(&self, scope: &OrgScope) -> TenancyResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE ($1::uuid IS NULL OR organization_id = $1)
            ORDER BY id DESC
            "#
        ))
        .bind(scope.org_id())
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Look up a payment by its transaction reference. Webhook-side callers
    /// hold no tenant context and pass [`OrgScope::all_organizations`].
    pub async fn find_by_tx_ref(
        &self,
        scope: &OrgScope,
        tx_ref: &str,
    ) -> TenancyResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE tx_ref = $1
              AND ($2::uuid IS NULL OR organization_id = $2)
            "#
        ))
        .bind(tx_ref)
        .bind(scope.org_id())
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Uniqueness probe for reference generation. References are unique
    /// across tenants, so callers pass [`OrgScope::all_organizations`].
    pub async fn tx_ref_exists(&self, scope: &OrgScope, tx_ref: &str) -> TenancyResult<bool> {
        let exists: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM payments
                WHERE tx_ref = $1
                  AND ($2::uuid IS NULL OR organization_id = $2)
            )
            "#,
        )
        .bind(tx_ref)
        .bind(scope.org_id())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }

    /// Transition to `completed`, capturing what the gateway reported.
    ///
    /// Deliberately unguarded on the current status: repeat or conflicting
    /// deliveries resolve last-write-wins at row-update granularity.
    pub async fn complete(
        &self,
        scope: &OrgScope,
        id: i64,
        gateway_reference: Option<&str>,
        channel: Option<&str>,
        customer: Option<&serde_json::Value>,
        gateway_payload: &serde_json::Value,
    ) -> TenancyResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = $3,
                gateway_reference = $4,
                channel = $5,
                customer = $6,
                gateway_payload = $7,
                completed_at = NOW(),
                failed_at = NULL,
                updated_at = NOW()
            WHERE id = $1
              AND ($2::uuid IS NULL OR organization_id = $2)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(scope.org_id())
        .bind(PaymentStatus::Completed)
        .bind(gateway_reference)
        .bind(channel)
        .bind(customer)
        .bind(gateway_payload)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Transition to `failed`, keeping the raw payload for audit. Unguarded
    /// for the same last-write-wins reason as [`Payments::complete`].
    pub async fn fail(
        &self,
        scope: &OrgScope,
        id: i64,
        gateway_payload: &serde_json::Value,
    ) -> TenancyResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = $3,
                gateway_payload = $4,
                failed_at = NOW(),
                completed_at = NULL,
                updated_at = NOW()
            WHERE id = $1
              AND ($2::uuid IS NULL OR organization_id = $2)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(scope.org_id())
        .bind(PaymentStatus::Failed)
        .bind(gateway_payload)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }
}
