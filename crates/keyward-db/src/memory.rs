//! In-memory repository implementations
//!
//! DashMap-backed stores with the same contracts as the Postgres ones. Each
//! key lives in a single shard, so `upsert` is atomic per (principal, app).
//! Used by tests and when the gateway runs without `DATABASE_URL`.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{HandoffRow, PrincipalRow, SessionRow, SessionWithPrincipal};
use crate::repo::{CreatePrincipal, HandoffRepository, PrincipalRepository, SessionRepository};

/// In-memory principal repository
#[derive(Default, Clone)]
pub struct MemoryPrincipalRepository {
    principals: Arc<DashMap<Uuid, PrincipalRow>>,
    by_email: Arc<DashMap<String, Uuid>>,
}

impl MemoryPrincipalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn exists(&self, id: Uuid) -> bool {
        self.principals.contains_key(&id)
    }

    fn profile(&self, id: Uuid) -> Option<(String, String)> {
        self.principals
            .get(&id)
            .map(|p| (p.name.clone(), p.email.clone()))
    }
}

#[async_trait]
impl PrincipalRepository for MemoryPrincipalRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PrincipalRow>> {
        Ok(self.principals.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<PrincipalRow>> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.principals.get(id.value()).map(|r| r.value().clone())))
    }

    async fn create(&self, principal: CreatePrincipal) -> DbResult<PrincipalRow> {
        // Claim the email first so two concurrent signups cannot both win
        match self.by_email.entry(principal.email.clone()) {
            Entry::Occupied(_) => {
                return Err(DbError::Conflict(format!(
                    "email {} already registered",
                    principal.email
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(principal.id);
            }
        }

        let now = Utc::now();
        let row = PrincipalRow {
            id: principal.id,
            name: principal.name,
            email: principal.email,
            password_hash: principal.password_hash,
            created_at: now,
            updated_at: now,
        };
        self.principals.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> DbResult<()> {
        let mut principal = self.principals.get_mut(&id).ok_or(DbError::NotFound)?;
        principal.password_hash = Some(password_hash.to_string());
        principal.updated_at = Utc::now();
        Ok(())
    }
}

/// In-memory session repository
///
/// Shares the principal maps so `get` can return the same profile snapshot
/// the Postgres join does.
#[derive(Clone)]
pub struct MemorySessionRepository {
    sessions: Arc<DashMap<(Uuid, Uuid), SessionRow>>,
    principals: MemoryPrincipalRepository,
}

impl MemorySessionRepository {
    pub fn new(principals: MemoryPrincipalRepository) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            principals,
        }
    }

    /// Number of live sessions across all principals
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn upsert(
        &self,
        principal_id: Uuid,
        app_id: Uuid,
        refresh_token: &str,
    ) -> DbResult<()> {
        if !self.principals.exists(principal_id) {
            return Err(DbError::ForeignKey(format!(
                "principal {principal_id} does not exist"
            )));
        }

        self.sessions.insert(
            (principal_id, app_id),
            SessionRow {
                principal_id,
                app_id,
                refresh_token: refresh_token.to_string(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get(&self, principal_id: Uuid, app_id: Uuid) -> DbResult<SessionWithPrincipal> {
        let refresh_token = self
            .sessions
            .get(&(principal_id, app_id))
            .map(|r| r.refresh_token.clone())
            .ok_or(DbError::NotFound)?;

        let (name, email) = self
            .principals
            .profile(principal_id)
            .ok_or(DbError::NotFound)?;

        Ok(SessionWithPrincipal {
            refresh_token,
            name,
            email,
        })
    }

    async fn delete(&self, principal_id: Uuid, app_id: Uuid) -> DbResult<()> {
        self.sessions.remove(&(principal_id, app_id));
        Ok(())
    }

    async fn delete_all_for_principal(&self, principal_id: Uuid) -> DbResult<u64> {
        let mut removed = 0;
        self.sessions.retain(|(owner, _), _| {
            if *owner == principal_id {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    async fn list_for_principal(&self, principal_id: Uuid) -> DbResult<Vec<SessionRow>> {
        let mut sessions: Vec<SessionRow> = self
            .sessions
            .iter()
            .filter(|r| r.principal_id == principal_id)
            .map(|r| r.value().clone())
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }
}

/// In-memory token handoff repository
#[derive(Default, Clone)]
pub struct MemoryHandoffRepository {
    handoffs: Arc<DashMap<Uuid, HandoffRow>>,
}

impl MemoryHandoffRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HandoffRepository for MemoryHandoffRepository {
    async fn insert(&self, handoff: &HandoffRow) -> DbResult<()> {
        match self.handoffs.entry(handoff.id) {
            Entry::Occupied(_) => Err(DbError::Conflict(format!(
                "handoff {} already exists",
                handoff.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(handoff.clone());
                Ok(())
            }
        }
    }

    async fn take(&self, id: Uuid) -> DbResult<HandoffRow> {
        self.handoffs
            .remove(&id)
            .map(|(_, row)| row)
            .ok_or(DbError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_principal(email: &str) -> CreatePrincipal {
        CreatePrincipal {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: None,
        }
    }

    #[tokio::test]
    async fn test_principal_repo_crud() {
        let repo = MemoryPrincipalRepository::new();

        let principal = repo.create(new_principal("test@example.com")).await.unwrap();

        let found = repo.find_by_id(principal.id).await.unwrap();
        assert_eq!(found.unwrap().email, "test@example.com");

        let found = repo.find_by_email("test@example.com").await.unwrap();
        assert!(found.is_some());

        repo.update_password_hash(principal.id, "$argon2id$fake")
            .await
            .unwrap();
        let found = repo.find_by_id(principal.id).await.unwrap().unwrap();
        assert_eq!(found.password_hash.as_deref(), Some("$argon2id$fake"));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = MemoryPrincipalRepository::new();
        repo.create(new_principal("dup@example.com")).await.unwrap();

        let result = repo.create(new_principal("dup@example.com")).await;
        assert!(matches!(result, Err(DbError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_password_unknown_principal() {
        let repo = MemoryPrincipalRepository::new();
        let result = repo.update_password_hash(Uuid::new_v4(), "hash").await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }

    #[tokio::test]
    async fn test_session_upsert_overwrites() {
        let principals = MemoryPrincipalRepository::new();
        let sessions = MemorySessionRepository::new(principals.clone());
        let principal = principals.create(new_principal("s@example.com")).await.unwrap();
        let app_id = Uuid::new_v4();

        sessions.upsert(principal.id, app_id, "first").await.unwrap();
        sessions.upsert(principal.id, app_id, "second").await.unwrap();

        let stored = sessions.get(principal.id, app_id).await.unwrap();
        assert_eq!(stored.refresh_token, "second");
        assert_eq!(stored.email, "s@example.com");
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_session_get_missing_is_not_found() {
        let sessions = MemorySessionRepository::new(MemoryPrincipalRepository::new());
        let result = sessions.get(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }

    #[tokio::test]
    async fn test_session_upsert_unknown_principal() {
        let sessions = MemorySessionRepository::new(MemoryPrincipalRepository::new());
        let result = sessions.upsert(Uuid::new_v4(), Uuid::new_v4(), "tok").await;
        assert!(matches!(result, Err(DbError::ForeignKey(_))));
    }

    #[tokio::test]
    async fn test_session_delete_is_idempotent() {
        let principals = MemoryPrincipalRepository::new();
        let sessions = MemorySessionRepository::new(principals.clone());
        let principal = principals.create(new_principal("d@example.com")).await.unwrap();
        let app_id = Uuid::new_v4();

        sessions.upsert(principal.id, app_id, "tok").await.unwrap();
        sessions.delete(principal.id, app_id).await.unwrap();
        sessions.delete(principal.id, app_id).await.unwrap();

        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_delete_all_for_principal() {
        let principals = MemoryPrincipalRepository::new();
        let sessions = MemorySessionRepository::new(principals.clone());
        let alice = principals.create(new_principal("a@example.com")).await.unwrap();
        let bob = principals.create(new_principal("b@example.com")).await.unwrap();

        for i in 0..3 {
            sessions
                .upsert(alice.id, Uuid::new_v4(), &format!("tok{i}"))
                .await
                .unwrap();
        }
        sessions.upsert(bob.id, Uuid::new_v4(), "bob").await.unwrap();

        let removed = sessions.delete_all_for_principal(alice.id).await.unwrap();
        assert_eq!(removed, 3);
        assert!(sessions.list_for_principal(alice.id).await.unwrap().is_empty());
        assert_eq!(sessions.list_for_principal(bob.id).await.unwrap().len(), 1);
    }

    fn new_handoff() -> HandoffRow {
        HandoffRow {
            id: Uuid::new_v4(),
            app_id: Uuid::new_v4(),
            principal_id: Uuid::new_v4(),
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_handoff_taken_once() {
        let handoffs = MemoryHandoffRepository::new();
        let row = new_handoff();
        handoffs.insert(&row).await.unwrap();

        let taken = handoffs.take(row.id).await.unwrap();
        assert_eq!(taken.refresh_token, "refresh");

        let again = handoffs.take(row.id).await;
        assert!(matches!(again, Err(DbError::NotFound)));
    }

    #[tokio::test]
    async fn test_handoff_duplicate_id_conflicts() {
        let handoffs = MemoryHandoffRepository::new();
        let row = new_handoff();
        handoffs.insert(&row).await.unwrap();

        let result = handoffs.insert(&row).await;
        assert!(matches!(result, Err(DbError::Conflict(_))));
    }
}
