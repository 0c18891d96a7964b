// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Invopay Tenancy Module
//!
//! Everything that makes the system multi-tenant: the request-scoped tenant
//! context, the organization scope filter that every tenant-owned data-access
//! call must pass through, and the repositories themselves.
//!
//! ## Design
//!
//! - **Explicit over ambient**: the current organization is carried by a
//!   [`TenantContext`] value built per request and passed into handlers, not
//!   read from a global. Repository calls take an [`OrgScope`] argument, so
//!   cross-tenant access is a visible choice at every call site.
//! - **Named escape hatches**: [`OrgScope::organization`] pins a specific
//!   organization regardless of context; [`OrgScope::all_organizations`]
//!   reads across tenants. Both stand out in code review, which is the point.

pub mod context;
pub mod error;
pub mod models;
pub mod repository;
pub mod scope;

pub use context::{Session, SessionStore, TenantContext};
pub use error::{TenancyError, TenancyResult};
pub use models::{
    Client, Currency, Invoice, InvoiceStatus, Membership, OrgRole, Organization, Payment,
    PaymentStatus, User,
};
pub use repository::{
    Clients, Currencies, Invoices, Memberships, NewClient, NewInvoice, NewOrganization, NewPayment,
    Organizations, Payments, Users,
};
pub use scope::OrgScope;
