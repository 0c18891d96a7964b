//! Per-organization currency usage. Tenant-owned.

use sqlx::PgPool;

use crate::error::TenancyResult;
use crate::models::Currency;
use crate::scope::OrgScope;

pub struct Currencies {
    pool: PgPool,
}

const CURRENCY_COLUMNS: &str = "id, organization_id, code, name, symbol, is_default";

impl Currencies {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, scope: &OrgScope) -> TenancyResult<Vec<Currency>> {
        let currencies = sqlx::query_as::<_, Currency>(&format!(
            r#"
            SELECT {CURRENCY_COLUMNS}
            FROM currencies
            WHERE ($1::uuid IS NULL OR organization_id = $1)
            ORDER BY id ASC
            "#
        ))
        .bind(scope.org_id())
        .fetch_all(&self.pool)
        .await?;

        Ok(currencies)
    }

    /// The organization's default invoicing currency, used when an invoice
    /// is created without one.
    pub async fn find_default(&self, scope: &OrgScope) -> TenancyResult<Option<Currency>> {
        let currency = sqlx::query_as::<_, Currency>(&format!(
            r#"
            SELECT {CURRENCY_COLUMNS}
            FROM currencies
            WHERE is_default
              AND ($1::uuid IS NULL OR organization_id = $1)
            ORDER BY id ASC
            LIMIT 1
            "#
        ))
        .bind(scope.org_id())
        .fetch_optional(&self.pool)
        .await?;

        Ok(currency)
    }
}
