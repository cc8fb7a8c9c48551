//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// Principal repository trait
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Find a principal by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PrincipalRow>>;

    /// Find a principal by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<PrincipalRow>>;

    /// Create a new principal; a taken email fails with `DbError::Conflict`
    async fn create(&self, principal: CreatePrincipal) -> DbResult<PrincipalRow>;

    /// Replace the stored password hash; unknown IDs fail with `DbError::NotFound`
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> DbResult<()>;
}

/// Create principal input
#[derive(Debug, Clone)]
pub struct CreatePrincipal {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
}

/// Session repository trait
///
/// Maps (principal, app) to the single current refresh token. Implementations
/// hold no business logic; rotation and revocation rules live in the session
/// manager.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create or replace the session for (principal, app).
    ///
    /// Must be atomic against concurrent upserts and deletes of the same key.
    async fn upsert(&self, principal_id: Uuid, app_id: Uuid, refresh_token: &str)
        -> DbResult<()>;

    /// Fetch the stored refresh token with a snapshot of the principal.
    ///
    /// Fails with `DbError::NotFound` when no session exists.
    async fn get(&self, principal_id: Uuid, app_id: Uuid) -> DbResult<SessionWithPrincipal>;

    /// Delete the session for (principal, app); succeeds when none exists
    async fn delete(&self, principal_id: Uuid, app_id: Uuid) -> DbResult<()>;

    /// Delete every session of a principal, returning how many were removed
    async fn delete_all_for_principal(&self, principal_id: Uuid) -> DbResult<u64>;

    /// List the sessions of a principal, most recently updated first
    async fn list_for_principal(&self, principal_id: Uuid) -> DbResult<Vec<SessionRow>>;

    /// Check the backing store is reachable
    async fn ping(&self) -> DbResult<()>;
}

/// Token handoff repository trait
///
/// Holds freshly issued pairs until the app they were issued for picks them
/// up. Each entry can be taken once.
#[async_trait]
pub trait HandoffRepository: Send + Sync {
    /// Park a pair; an unknown app fails with `DbError::ForeignKey`
    async fn insert(&self, handoff: &HandoffRow) -> DbResult<()>;

    /// Remove and return an entry; fails with `DbError::NotFound` when it is
    /// missing or already taken
    async fn take(&self, id: Uuid) -> DbResult<HandoffRow>;
}
