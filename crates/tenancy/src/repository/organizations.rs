//! Organization lifecycle and membership-driven listing.
//!
//! Organizations are the tenant root, so they are not themselves scope
//! filtered — access control here is membership-based instead.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::TenancyResult;
use crate::models::{OrgRole, Organization};

pub struct NewOrganization {
    pub name: String,
    /// Derived from the name when not supplied.
    pub slug: Option<String>,
    pub billing_email: Option<String>,
    pub billing_address: Option<String>,
}

pub struct Organizations {
    pool: PgPool,
}

const ORGANIZATION_COLUMNS: &str = "id, name, slug, billing_email, billing_address, active, \
     settings, created_at, updated_at";

impl Organizations {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an organization with its owner membership and a default
    /// currency, atomically. This is the onboarding entry point.
    pub async fn create(&self, new: NewOrganization, owner: Uuid) -> TenancyResult<Organization> {
        let slug = new.slug.unwrap_or_else(|| slugify(&new.name));

        let mut tx = self.pool.begin().await?;

        let organization = sqlx::query_as::<_, Organization>(&format!(
            r#"
            INSERT INTO organizations (name, slug, billing_email, billing_address)
            VALUES ($1, $2, $3, $4)
            RETURNING {ORGANIZATION_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&slug)
        .bind(&new.billing_email)
        .bind(&new.billing_address)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO organization_members (organization_id, user_id, role)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(organization.id)
        .bind(owner)
        .bind(OrgRole::Owner)
        .execute(&mut *tx)
        .await?;

        // Seed the default invoicing currency so invoices can be created
        // immediately after onboarding.
        sqlx::query(
            r#"
            INSERT INTO currencies (organization_id, code, name, symbol, is_default)
            VALUES ($1, 'MWK', 'Malawian Kwacha', 'MK', TRUE)
            "#,
        )
        .bind(organization.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            org_id = %organization.id,
            owner = %owner,
            slug = %organization.slug,
            "Created organization"
        );

        Ok(organization)
    }

    pub async fn find(&self, id: Uuid) -> TenancyResult<Option<Organization>> {
        let organization = sqlx::query_as::<_, Organization>(&format!(
            r#"
            SELECT {ORGANIZATION_COLUMNS}
            FROM organizations
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organization)
    }

    /// Active organizations the user holds an active membership in, ordered
    /// by when the user joined them.
    pub async fn list_for_user(&self, user_id: Uuid) -> TenancyResult<Vec<Organization>> {
        let organizations = sqlx::query_as::<_, Organization>(
            r#"
            SELECT o.id, o.name, o.slug, o.billing_email, o.billing_address, o.active,
                   o.settings, o.created_at, o.updated_at
            FROM organizations o
            JOIN organization_members m ON m.organization_id = o.id
            WHERE m.user_id = $1
              AND m.active
              AND o.active
            ORDER BY m.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(organizations)
    }
}

/// Lowercase, non-alphanumerics collapsed to single dashes.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugs_are_lowercase_dashed() {
        assert_eq!(slugify("Acme Traders Ltd."), "acme-traders-ltd");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
        assert_eq!(slugify("Chikondi & Sons"), "chikondi-sons");
    }
}
