//! Repository helpers for testing

use async_trait::async_trait;
use keyward_db::{
    CreatePrincipal, DbError, DbResult, MemoryPrincipalRepository, MemorySessionRepository,
    PrincipalRepository, SessionRepository, SessionRow, SessionWithPrincipal,
};
use keyward_types::Principal;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Session repository whose writes can be switched off
///
/// Wraps the in-memory store; while `fail_writes` is set every `upsert`
/// fails with a connection-level error and leaves the inner store untouched.
pub struct FlakySessionRepository {
    pub inner: MemorySessionRepository,
    fail_writes: AtomicBool,
}

impl FlakySessionRepository {
    pub fn new(principals: MemoryPrincipalRepository) -> Self {
        Self {
            inner: MemorySessionRepository::new(principals),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The refresh token currently stored for (principal, app), if any
    #[allow(dead_code)]
    pub async fn stored_token(&self, principal_id: Uuid, app_id: Uuid) -> Option<String> {
        self.inner
            .get(principal_id, app_id)
            .await
            .ok()
            .map(|s| s.refresh_token)
    }
}

#[async_trait]
impl SessionRepository for FlakySessionRepository {
    async fn upsert(&self, principal_id: Uuid, app_id: Uuid, refresh_token: &str) -> DbResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        self.inner.upsert(principal_id, app_id, refresh_token).await
    }

    async fn get(&self, principal_id: Uuid, app_id: Uuid) -> DbResult<SessionWithPrincipal> {
        self.inner.get(principal_id, app_id).await
    }

    async fn delete(&self, principal_id: Uuid, app_id: Uuid) -> DbResult<()> {
        self.inner.delete(principal_id, app_id).await
    }

    async fn delete_all_for_principal(&self, principal_id: Uuid) -> DbResult<u64> {
        self.inner.delete_all_for_principal(principal_id).await
    }

    async fn list_for_principal(&self, principal_id: Uuid) -> DbResult<Vec<SessionRow>> {
        self.inner.list_for_principal(principal_id).await
    }

    async fn ping(&self) -> DbResult<()> {
        self.inner.ping().await
    }
}

/// Insert a password-less principal directly
#[allow(dead_code)]
pub async fn seed_principal(principals: &MemoryPrincipalRepository, email: &str) -> Principal {
    principals
        .create(CreatePrincipal {
            id: Uuid::new_v4(),
            name: "Test Principal".to_string(),
            email: email.to_string(),
            password_hash: None,
        })
        .await
        .unwrap()
        .to_principal()
}
