//! PostgreSQL session repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{SessionRow, SessionWithPrincipal};
use crate::repo::SessionRepository;

/// PostgreSQL session repository
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn upsert(
        &self,
        principal_id: Uuid,
        app_id: Uuid,
        refresh_token: &str,
    ) -> DbResult<()> {
        // Single statement: the row lock taken by ON CONFLICT serializes
        // concurrent writers on the same key.
        sqlx::query(
            r#"
            INSERT INTO sessions (principal_id, app_id, refresh_token)
            VALUES ($1, $2, $3)
            ON CONFLICT (principal_id, app_id) DO UPDATE
            SET refresh_token = EXCLUDED.refresh_token, updated_at = NOW()
            "#,
        )
        .bind(principal_id)
        .bind(app_id)
        .bind(refresh_token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, principal_id: Uuid, app_id: Uuid) -> DbResult<SessionWithPrincipal> {
        let session = sqlx::query_as::<_, SessionWithPrincipal>(
            r#"
            SELECT s.refresh_token, p.name, p.email
            FROM sessions s
            INNER JOIN principals p ON s.principal_id = p.id
            WHERE s.principal_id = $1 AND s.app_id = $2
            "#,
        )
        .bind(principal_id)
        .bind(app_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    async fn delete(&self, principal_id: Uuid, app_id: Uuid) -> DbResult<()> {
        sqlx::query("DELETE FROM sessions WHERE principal_id = $1 AND app_id = $2")
            .bind(principal_id)
            .bind(app_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_all_for_principal(&self, principal_id: Uuid) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE principal_id = $1")
            .bind(principal_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_for_principal(&self, principal_id: Uuid) -> DbResult<Vec<SessionRow>> {
        let sessions = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT principal_id, app_id, refresh_token, updated_at
            FROM sessions
            WHERE principal_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(principal_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
