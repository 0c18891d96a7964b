//! Row types for tenants, memberships, and tenant-owned entities.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// An authenticated account. Only exists as the subject of memberships and
/// sessions; everything business-facing hangs off an organization.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub created_at: OffsetDateTime,
}

/// Tenant root. All business data is partitioned by organization.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub billing_email: Option<String>,
    pub billing_address: Option<String>,
    /// Organizations are deactivated, never hard-deleted.
    pub active: bool,
    pub settings: serde_json::Value,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Role a user holds within one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "org_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    Owner,
    Admin,
    Manager,
    Accountant,
    User,
}

impl OrgRole {
    /// Whether this role can see gateway balances and initiate payments on
    /// behalf of the organization.
    pub fn can_manage_billing(&self) -> bool {
        matches!(self, OrgRole::Owner | OrgRole::Admin | OrgRole::Accountant)
    }

    pub fn can_manage_members(&self) -> bool {
        matches!(self, OrgRole::Owner | OrgRole::Admin)
    }
}

/// A user's role-bearing association with one organization.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Membership {
    /// BIGSERIAL; the lowest id is the user's earliest membership, which is
    /// what default-organization selection keys on.
    pub id: i64,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role: OrgRole,
    pub active: bool,
    pub created_at: OffsetDateTime,
}

/// A billable counterparty of one organization.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Client {
    pub id: i64,
    pub organization_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: OffsetDateTime,
}

/// A currency an organization invoices in.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Currency {
    pub id: i64,
    pub organization_id: Uuid,
    pub code: String,
    pub name: String,
    pub symbol: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    /// Whether a payment can still be initiated against the invoice.
    pub fn is_payable(&self) -> bool {
        matches!(self, InvoiceStatus::Draft | InvoiceStatus::Sent)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Invoice {
    pub id: i64,
    pub organization_id: Uuid,
    pub client_id: i64,
    pub currency: String,
    pub status: InvoiceStatus,
    /// Minor units (cents). Formatting to major units happens at the
    /// gateway boundary.
    pub total_cents: i64,
    pub notes: Option<String>,
    pub issued_at: OffsetDateTime,
    pub due_date: Option<time::Date>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }
}

/// One attempted transaction against an invoice.
///
/// Created by payment initiation, mutated only by webhook reconciliation or
/// its synchronous verification equivalent, never deleted.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Payment {
    pub id: i64,
    pub invoice_id: i64,
    pub organization_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    /// Locally generated, unique, immutable once created.
    pub tx_ref: String,
    pub gateway: String,
    pub status: PaymentStatus,
    /// Reference assigned by the gateway, captured on completion.
    pub gateway_reference: Option<String>,
    pub channel: Option<String>,
    pub customer: Option<serde_json::Value>,
    /// Raw gateway payload kept for audit.
    pub gateway_payload: Option<serde_json::Value>,
    pub completed_at: Option<OffsetDateTime>,
    pub failed_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
