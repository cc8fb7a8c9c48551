//! Token handoff to client applications
//!
//! After a login against an app, the issued pair is parked under a random
//! [`HandoffId`]. The client passes that id to the app's callback, and the
//! app collects the pair once. Entries older than the configured TTL are
//! treated as missing.

use chrono::Utc;
use keyward_db::{DbError, HandoffRepository, HandoffRow};
use keyward_types::{AppId, HandoffId, HandoffTokens, PrincipalId, TokenPair};
use std::sync::Arc;
use std::time::Duration;

use crate::{AuthConfig, AuthError};

/// Parks issued token pairs until their app collects them
pub struct TokenHandoff<H: HandoffRepository + ?Sized> {
    repo: Arc<H>,
    ttl: Duration,
    access_token_ttl: Duration,
}

impl<H: HandoffRepository + ?Sized> TokenHandoff<H> {
    pub fn new(config: &AuthConfig, repo: Arc<H>) -> Self {
        Self {
            repo,
            ttl: config.handoff_ttl,
            access_token_ttl: config.access_token_ttl,
        }
    }

    /// Park `tokens` for `app_id` and return the id to collect them with
    pub async fn deposit(
        &self,
        principal_id: PrincipalId,
        app_id: AppId,
        tokens: &TokenPair,
    ) -> Result<HandoffId, AuthError> {
        let id = HandoffId::new();
        self.repo
            .insert(&HandoffRow {
                id: id.0,
                app_id: app_id.0,
                principal_id: principal_id.0,
                access_token: tokens.access_token.clone(),
                refresh_token: tokens.refresh_token.clone(),
                created_at: Utc::now(),
            })
            .await?;

        tracing::debug!(%principal_id, %app_id, handoff_id = %id, "Token pair parked");
        Ok(id)
    }

    /// Collect a parked pair. Works once per id.
    pub async fn collect(&self, id: HandoffId) -> Result<HandoffTokens, AuthError> {
        let row = self.repo.take(id.0).await.map_err(|e| match e {
            DbError::NotFound => {
                tracing::debug!(handoff_id = %id, "Unknown or collected handoff");
                AuthError::HandoffNotFound
            }
            other => other.into(),
        })?;

        // A clock step backwards counts as zero age
        let age = Utc::now()
            .signed_duration_since(row.created_at)
            .to_std()
            .unwrap_or_default();
        if age > self.ttl {
            tracing::debug!(handoff_id = %id, "Handoff expired before collection");
            return Err(AuthError::HandoffNotFound);
        }

        tracing::info!(handoff_id = %id, app_id = %row.app_id, "Token pair collected");
        let expires_in = self.access_token_ttl.saturating_sub(age).as_secs();
        Ok(HandoffTokens {
            principal_id: PrincipalId(row.principal_id),
            app_id: AppId(row.app_id),
            tokens: TokenPair::bearer(row.access_token, row.refresh_token, expires_in),
        })
    }
}

impl<H: HandoffRepository + ?Sized> std::fmt::Debug for TokenHandoff<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenHandoff")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyward_db::MemoryHandoffRepository;

    fn handoff(config: &AuthConfig) -> (TokenHandoff<MemoryHandoffRepository>, Arc<MemoryHandoffRepository>) {
        let repo = Arc::new(MemoryHandoffRepository::new());
        (TokenHandoff::new(config, Arc::clone(&repo)), repo)
    }

    #[tokio::test]
    async fn test_collect_once() {
        let (handoff, _) = handoff(&AuthConfig::default());
        let principal_id = PrincipalId::new();
        let app_id = AppId::new();
        let pair = TokenPair::bearer("a.b.c", "d.e.f", 900);

        let id = handoff.deposit(principal_id, app_id, &pair).await.unwrap();
        let collected = handoff.collect(id).await.unwrap();
        assert_eq!(collected.principal_id, principal_id);
        assert_eq!(collected.app_id, app_id);
        assert_eq!(collected.tokens.refresh_token, "d.e.f");
        assert!(collected.tokens.expires_in <= 900);

        let again = handoff.collect(id).await;
        assert!(matches!(again, Err(AuthError::HandoffNotFound)));
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let (handoff, _) = handoff(&AuthConfig::default());
        let result = handoff.collect(HandoffId::new()).await;
        assert!(matches!(result, Err(AuthError::HandoffNotFound)));
    }

    #[tokio::test]
    async fn test_expired_handoff_is_gone() {
        let (handoff, repo) = handoff(&AuthConfig::default().with_handoff_ttl(Duration::from_secs(60)));
        let id = HandoffId::new();
        repo.insert(&HandoffRow {
            id: id.0,
            app_id: AppId::new().0,
            principal_id: PrincipalId::new().0,
            access_token: "a.b.c".to_string(),
            refresh_token: "d.e.f".to_string(),
            created_at: Utc::now() - chrono::Duration::seconds(120),
        })
        .await
        .unwrap();

        let result = handoff.collect(id).await;
        assert!(matches!(result, Err(AuthError::HandoffNotFound)));
        assert!(matches!(repo.take(id.0).await, Err(DbError::NotFound)));
    }
}
