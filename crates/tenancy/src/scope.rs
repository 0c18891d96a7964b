//! Organization scope filter.
//!
//! Every repository method that touches a tenant-owned table takes an
//! [`OrgScope`] argument. The default path derives the scope from the
//! request's [`TenantContext`]; the two bypass constructors are deliberately
//! loud so that cross-tenant access is visible at the call site.

use uuid::Uuid;

use crate::context::TenantContext;
use crate::error::{TenancyError, TenancyResult};

/// Which organizations a repository call may see or stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgScope {
    /// Restrict reads to one organization and stamp creates with it.
    Organization(Uuid),
    /// No filter. Reads span every tenant; creates must carry an explicit
    /// organization id. Reserved for system paths (reconciliation,
    /// reporting, migration) that run outside a user session.
    AllOrganizations,
}

impl OrgScope {
    /// The default, tenant-facing path: scope to the context's current
    /// organization. Errors when none is selected — tenant-facing code can
    /// never fall through to a cross-tenant query by accident.
    pub fn current(ctx: &TenantContext) -> TenancyResult<Self> {
        ctx.current_organization_id()
            .map(OrgScope::Organization)
            .ok_or(TenancyError::NoOrganizationSelected)
    }

    /// Named bypass: pin a specific organization regardless of any session
    /// context. Used by admin and background work, and by the webhook
    /// reconciler once it has resolved which tenant a payment belongs to.
    pub fn organization(id: Uuid) -> Self {
        OrgScope::Organization(id)
    }

    /// Named bypass: query across every organization.
    pub fn all_organizations() -> Self {
        OrgScope::AllOrganizations
    }

    /// The filter value repositories bind into `organization_id = $n`
    /// predicates; `None` means no restriction.
    pub fn org_id(&self) -> Option<Uuid> {
        match self {
            OrgScope::Organization(id) => Some(*id),
            OrgScope::AllOrganizations => None,
        }
    }

    /// Resolve the organization id to stamp onto a new tenant-owned row.
    ///
    /// An explicitly supplied value always wins; otherwise the scope's own
    /// organization is used. Creating under [`OrgScope::AllOrganizations`]
    /// without an explicit value is an error, not a silently unscoped row.
    pub fn stamp(&self, explicit: Option<Uuid>) -> TenancyResult<Uuid> {
        if let Some(id) = explicit {
            return Ok(id);
        }
        self.org_id().ok_or(TenancyError::MissingOrganizationId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SessionStore;

    async fn context_with_org(org: Option<Uuid>) -> TenantContext {
        let store = SessionStore::new();
        let session_id = store.issue(Uuid::new_v4()).await;
        let mut ctx = TenantContext::load(&store, session_id)
            .await
            .expect("session was just issued");
        ctx.set_current_organization(org).await;
        ctx
    }

    #[tokio::test]
    async fn current_requires_an_organization() {
        let ctx = context_with_org(None).await;
        assert!(matches!(
            OrgScope::current(&ctx),
            Err(TenancyError::NoOrganizationSelected)
        ));

        let org = Uuid::new_v4();
        let ctx = context_with_org(Some(org)).await;
        assert_eq!(OrgScope::current(&ctx).unwrap(), OrgScope::Organization(org));
    }

    #[test]
    fn filter_value_per_scope() {
        let org = Uuid::new_v4();
        assert_eq!(OrgScope::organization(org).org_id(), Some(org));
        assert_eq!(OrgScope::all_organizations().org_id(), None);
    }

    #[test]
    fn stamp_never_overwrites_an_explicit_value() {
        let scoped = Uuid::new_v4();
        let explicit = Uuid::new_v4();
        let scope = OrgScope::organization(scoped);
        assert_eq!(scope.stamp(Some(explicit)).unwrap(), explicit);
        assert_eq!(scope.stamp(None).unwrap(), scoped);
    }

    #[test]
    fn stamp_rejects_unscoped_creates() {
        let scope = OrgScope::all_organizations();
        assert!(matches!(
            scope.stamp(None),
            Err(TenancyError::MissingOrganizationId)
        ));
        // Explicit value still works under the cross-tenant scope.
        let explicit = Uuid::new_v4();
        assert_eq!(scope.stamp(Some(explicit)).unwrap(), explicit);
    }
}
