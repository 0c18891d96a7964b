//! Client (billable counterparty) repository. Tenant-owned.

use sqlx::PgPool;

use crate::error::TenancyResult;
use crate::models::Client;
use crate::scope::OrgScope;
use uuid::Uuid;

pub struct NewClient {
    pub name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Explicit organization; when `None` the scope stamps it.
    pub organization_id: Option<Uuid>,
}

pub struct Clients {
    pool: PgPool,
}

const CLIENT_COLUMNS: &str = "id, organization_id, name, email, address, created_at";

impl Clients {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, scope: &OrgScope, new: NewClient) -> TenancyResult<Client> {
        let organization_id = scope.stamp(new.organization_id)?;

        let client = sqlx::query_as::<_, Client>(&format!(
            r#"
            INSERT INTO clients (organization_id, name, email, address)
            VALUES ($1, $2, $3, $4)
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.address)
        .fetch_one(&self.pool)
        .await?;

        Ok(client)
    }

    pub async fn find(&self, scope: &OrgScope, id: i64) -> TenancyResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(&format!(
            r#"
            SELECT {CLIENT_COLUMNS}
            FROM clients
            WHERE id = $1
              AND ($2::uuid IS NULL OR organization_id = $2)
            "#
        ))
        .bind(id)
        .bind(scope.org_id())
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    pub async fn list(&self, scope: &OrgScope) -> TenancyResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            r#"
            SELECT {CLIENT_COLUMNS}
            FROM clients
            WHERE ($1::uuid IS NULL OR organization_id = $1)
            ORDER BY id ASC
            "#
        ))
        .bind(scope.org_id())
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }
}
