//! Tenancy error types

use thiserror::Error;

/// Errors produced by the tenancy layer.
#[derive(Debug, Error)]
pub enum TenancyError {
    /// The caller asked for the default (context-scoped) path but the
    /// session carries no organization. The cross-tenant no-op filter is
    /// only reachable through the named bypass constructors.
    #[error("no organization selected for this session")]
    NoOrganizationSelected,

    /// A tenant-owned record was created without an organization id and the
    /// active scope cannot supply one.
    #[error("cannot create a tenant-owned record without an organization id")]
    MissingOrganizationId,

    /// The user has no active membership in the requested organization.
    #[error("user is not an active member of this organization")]
    NotAMember,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type TenancyResult<T> = Result<T, TenancyError>;
