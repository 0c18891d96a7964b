//! Repositories for tenant-owned (and tenant-adjacent) tables.
//!
//! Every method that reads or writes a tenant-owned table takes an
//! [`crate::OrgScope`]. The filter is applied with a single bound predicate,
//! `($n::uuid IS NULL OR organization_id = $n)`, so the scoped and bypass
//! paths share one query shape.

mod clients;
mod currencies;
mod invoices;
mod memberships;
mod organizations;
mod payments;
mod users;

pub use clients::{Clients, NewClient};
pub use currencies::Currencies;
pub use invoices::{Invoices, NewInvoice};
pub use memberships::Memberships;
pub use organizations::{NewOrganization, Organizations};
pub use payments::{NewPayment, Payments};
pub use users::Users;
