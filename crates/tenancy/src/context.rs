//! Session store and request-scoped tenant context.
//!
//! The current organization lives in session state, never in a persisted
//! schema. Handlers receive a [`TenantContext`] built by the auth middleware;
//! they read the current organization from it and derive an
//! [`crate::OrgScope`] for repository calls. There is no globally accessible
//! "current organization" — the context object is the only way in.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::TenancyResult;
use crate::models::Membership;
use crate::repository::Memberships;

/// Per-session state. Ephemeral — lives only as long as the process.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    /// At most one organization. The selection flow guarantees it references
    /// an active membership of the user; the store itself does not.
    pub current_organization_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

/// In-process session store keyed by opaque session id.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh session for an authenticated user.
    pub async fn issue(&self, user_id: Uuid) -> Uuid {
        let session_id = Uuid::new_v4();
        let session = Session {
            user_id,
            current_organization_id: None,
            created_at: OffsetDateTime::now_utc(),
        };
        self.inner.write().await.insert(session_id, session);
        session_id
    }

    pub async fn get(&self, session_id: Uuid) -> Option<Session> {
        self.inner.read().await.get(&session_id).cloned()
    }

    /// Store or clear the session's current organization.
    pub async fn set_current_organization(&self, session_id: Uuid, org_id: Option<Uuid>) {
        if let Some(session) = self.inner.write().await.get_mut(&session_id) {
            session.current_organization_id = org_id;
        }
    }

    /// Returns true if the session existed.
    pub async fn revoke(&self, session_id: Uuid) -> bool {
        self.inner.write().await.remove(&session_id).is_some()
    }
}

/// Request-scoped view of the authenticated session.
///
/// Cheap to clone (the store is an `Arc`); mutations write through to the
/// session store so the organization choice outlives the request.
#[derive(Clone)]
pub struct TenantContext {
    session_id: Uuid,
    user_id: Uuid,
    current_organization_id: Option<Uuid>,
    store: SessionStore,
}

impl TenantContext {
    /// Build a context from a live session, or `None` for an unknown id.
    pub async fn load(store: &SessionStore, session_id: Uuid) -> Option<Self> {
        let session = store.get(session_id).await?;
        Some(Self {
            session_id,
            user_id: session.user_id,
            current_organization_id: session.current_organization_id,
            store: store.clone(),
        })
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// The session's current organization, if one is selected. No side
    /// effects.
    pub fn current_organization_id(&self) -> Option<Uuid> {
        self.current_organization_id
    }

    /// Store or clear the current organization, writing through to the
    /// session store.
    pub async fn set_current_organization(&mut self, org_id: Option<Uuid>) {
        self.current_organization_id = org_id;
        self.store
            .set_current_organization(self.session_id, org_id)
            .await;
    }

    /// Make sure the session has a current organization.
    ///
    /// If none is selected, picks the user's earliest active membership
    /// (lowest membership id — deterministic) whose organization is still
    /// active, and selects it. No-op when already set, so calling it twice
    /// yields the same organization as calling it once.
    pub async fn ensure_organization(&mut self, pool: &PgPool) -> TenancyResult<Option<Uuid>> {
        if let Some(current) = self.current_organization_id {
            return Ok(Some(current));
        }

        let memberships = Memberships::new(pool.clone());
        match memberships.find_default_for_user(self.user_id).await? {
            Some(membership) => {
                tracing::debug!(
                    user_id = %self.user_id,
                    org_id = %membership.organization_id,
                    membership_id = membership.id,
                    "Selected default organization for session"
                );
                self.set_current_organization(Some(membership.organization_id))
                    .await;
                Ok(Some(membership.organization_id))
            }
            None => Ok(None),
        }
    }

    /// The caller's membership row for the current organization, or `None`
    /// when no organization is selected or the user is not a member.
    pub async fn current_membership(&self, pool: &PgPool) -> TenancyResult<Option<Membership>> {
        let Some(org_id) = self.current_organization_id else {
            return Ok(None);
        };
        let memberships = Memberships::new(pool.clone());
        memberships.find_for_user(org_id, self.user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issue_and_load_round_trip() {
        let store = SessionStore::new();
        let user_id = Uuid::new_v4();
        let session_id = store.issue(user_id).await;

        let ctx = TenantContext::load(&store, session_id).await.unwrap();
        assert_eq!(ctx.user_id(), user_id);
        assert_eq!(ctx.current_organization_id(), None);
    }

    #[tokio::test]
    async fn unknown_session_does_not_load() {
        let store = SessionStore::new();
        assert!(TenantContext::load(&store, Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn organization_choice_survives_reload() {
        let store = SessionStore::new();
        let session_id = store.issue(Uuid::new_v4()).await;
        let org_id = Uuid::new_v4();

        let mut ctx = TenantContext::load(&store, session_id).await.unwrap();
        ctx.set_current_organization(Some(org_id)).await;

        let reloaded = TenantContext::load(&store, session_id).await.unwrap();
        assert_eq!(reloaded.current_organization_id(), Some(org_id));

        let mut reloaded = reloaded;
        reloaded.set_current_organization(None).await;
        let cleared = TenantContext::load(&store, session_id).await.unwrap();
        assert_eq!(cleared.current_organization_id(), None);
    }

    #[tokio::test]
    async fn revoked_sessions_stop_loading() {
        let store = SessionStore::new();
        let session_id = store.issue(Uuid::new_v4()).await;
        assert!(store.revoke(session_id).await);
        assert!(!store.revoke(session_id).await);
        assert!(TenantContext::load(&store, session_id).await.is_none());
    }

    #[tokio::test]
    async fn ensure_organization_is_a_noop_when_already_set() {
        // A lazy pool never connects; if ensure_organization touched the
        // database here the test would fail on acquire.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unreachable")
            .unwrap();

        let store = SessionStore::new();
        let session_id = store.issue(Uuid::new_v4()).await;
        let org_id = Uuid::new_v4();

        let mut ctx = TenantContext::load(&store, session_id).await.unwrap();
        ctx.set_current_organization(Some(org_id)).await;

        assert_eq!(ctx.ensure_organization(&pool).await.unwrap(), Some(org_id));
        assert_eq!(ctx.ensure_organization(&pool).await.unwrap(), Some(org_id));
    }
}
