//! PostgreSQL token handoff repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::HandoffRow;
use crate::repo::HandoffRepository;

/// PostgreSQL token handoff repository
#[derive(Clone)]
pub struct PgHandoffRepository {
    pool: PgPool,
}

impl PgHandoffRepository {
    /// Create a new handoff repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HandoffRepository for PgHandoffRepository {
    async fn insert(&self, handoff: &HandoffRow) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO token_handoffs
                (id, app_id, principal_id, access_token, refresh_token, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(handoff.id)
        .bind(handoff.app_id)
        .bind(handoff.principal_id)
        .bind(&handoff.access_token)
        .bind(&handoff.refresh_token)
        .bind(handoff.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn take(&self, id: Uuid) -> DbResult<HandoffRow> {
        // DELETE .. RETURNING hands the row to exactly one caller
        let row = sqlx::query_as::<_, HandoffRow>(
            r#"
            DELETE FROM token_handoffs
            WHERE id = $1
            RETURNING id, app_id, principal_id, access_token, refresh_token, created_at
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
