//! Membership lookups backing org-selection and permission checks.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::TenancyResult;
use crate::models::Membership;

pub struct Memberships {
    pool: PgPool,
}

const MEMBERSHIP_COLUMNS: &str = "id, organization_id, user_id, role, active, created_at";

impl Memberships {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The user's active membership in one organization, if any.
    pub async fn find_for_user(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> TenancyResult<Option<Membership>> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            r#"
            SELECT {MEMBERSHIP_COLUMNS}
            FROM organization_members
            WHERE organization_id = $1
              AND user_id = $2
              AND active
            "#
        ))
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(membership)
    }

    /// The membership that becomes the session's organization when none is
    /// selected: the user's earliest active membership (lowest id) whose
    /// organization is still active. The ordering is what makes default
    /// selection deterministic.
    pub async fn find_default_for_user(&self, user_id: Uuid) -> TenancyResult<Option<Membership>> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT m.id, m.organization_id, m.user_id, m.role, m.active, m.created_at
            FROM organization_members m
            JOIN organizations o ON o.id = m.organization_id
            WHERE m.user_id = $1
              AND m.active
              AND o.active
            ORDER BY m.id ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(membership)
    }
}
