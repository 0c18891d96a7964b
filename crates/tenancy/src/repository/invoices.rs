//! Invoice repository. Tenant-owned.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::TenancyResult;
use crate::models::{Invoice, InvoiceStatus};
use crate::scope::OrgScope;

pub struct NewInvoice {
    pub client_id: i64,
    pub currency: String,
    pub total_cents: i64,
    pub notes: Option<String>,
    pub due_date: Option<time::Date>,
    /// Explicit organization; when `None` the scope stamps it.
    pub organization_id: Option<Uuid>,
}

pub struct Invoices {
    pool: PgPool,
}

const INVOICE_COLUMNS: &str = "id, organization_id, client_id, currency, status, total_cents, \
     notes, issued_at, due_date, created_at, updated_at";

impl Invoices {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, scope: &OrgScope, new: NewInvoice) -> TenancyResult<Invoice> {
        let organization_id = scope.stamp(new.organization_id)?;

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices (organization_id, client_id, currency, status, total_cents,
                                  notes, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(new.client_id)
        .bind(&new.currency)
        .bind(InvoiceStatus::Sent)
        .bind(new.total_cents)
        .bind(&new.notes)
        .bind(new.due_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(invoice)
    }

    pub async fn find(&self, scope: &OrgScope, id: i64) -> TenancyResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices
            WHERE id = $1
              AND ($2::uuid IS NULL OR organization_id = $2)
            "#
        ))
        .bind(id)
        .bind(scope.org_id())
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    pub async fn list(&self, scope: &OrgScope) -> TenancyResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices
            WHERE ($1::uuid IS NULL OR organization_id = $1)
            ORDER BY id DESC
            "#
        ))
        .bind(scope.org_id())
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Mark an invoice paid (called when a payment against it completes).
    /// Returns false when the invoice is not visible under the scope.
    pub async fn mark_paid(&self, scope: &OrgScope, id: i64) -> TenancyResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE invoices
            SET status = $3, updated_at = NOW()
            WHERE id = $1
              AND ($2::uuid IS NULL OR organization_id = $2)
            "#,
        )
        .bind(id)
        .bind(scope.org_id())
        .bind(InvoiceStatus::Paid)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}
