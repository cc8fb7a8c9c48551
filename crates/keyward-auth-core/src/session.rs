//! Session management with refresh token rotation
//!
//! A session is the single live refresh token stored for a (principal, app)
//! pair. Refresh succeeds only when the presented token is byte-identical to
//! the stored one, and every success replaces it. A replayed or raced token
//! therefore fails with [`AuthError::StaleToken`].

use keyward_db::{DbError, SessionRepository};
use keyward_types::{ActiveSession, AppId, Principal, PrincipalId, SessionKey, TokenPair};
use std::sync::Arc;

use crate::crypto::{constant_time_str_eq, token_fingerprint, RsaKeyPair};
use crate::token::{AccessClaims, RefreshClaims, TokenCodec};
use crate::{AuthConfig, AuthError};

/// Session manager
pub struct SessionManager<R: SessionRepository + ?Sized> {
    codec: TokenCodec,
    config: AuthConfig,
    repo: Arc<R>,
}

impl<R: SessionRepository + ?Sized> SessionManager<R> {
    /// Create a new session manager
    pub fn new(keys: RsaKeyPair, config: AuthConfig, repo: Arc<R>) -> Self {
        Self {
            codec: TokenCodec::new(keys, config.issuer.clone()),
            config,
            repo,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Mint a token pair for a freshly authenticated principal.
    ///
    /// With an app, the refresh token becomes that session's live token and
    /// any earlier one for the same app stops working. Without an app nothing
    /// is stored and the refresh token can never be redeemed.
    pub async fn issue_for_login(
        &self,
        principal: &Principal,
        app_id: Option<AppId>,
    ) -> Result<TokenPair, AuthError> {
        let pair = self.mint_pair(principal.id, &principal.name, &principal.email)?;

        match app_id {
            Some(app_id) => {
                self.repo
                    .upsert(principal.id.0, app_id.0, &pair.refresh_token)
                    .await?;
                tracing::info!(principal_id = %principal.id, %app_id, "Session opened");
            }
            None => {
                tracing::debug!(principal_id = %principal.id, "Issued stateless token pair");
            }
        }

        Ok(pair)
    }

    /// Exchange the live refresh token of a session for a new pair.
    ///
    /// Fails without touching the store unless the token verifies, belongs
    /// to `principal_id`, and matches the stored token exactly.
    pub async fn refresh(
        &self,
        presented: &str,
        principal_id: PrincipalId,
        app_id: AppId,
    ) -> Result<TokenPair, AuthError> {
        let claims: RefreshClaims = self.codec.decode(presented)?;
        if claims.principal_id != principal_id {
            tracing::warn!(
                %principal_id,
                token_principal = %claims.principal_id,
                "Refresh token presented for another principal"
            );
            return Err(AuthError::MalformedClaims);
        }
        let key = SessionKey::new(principal_id, app_id);

        let session = self
            .repo
            .get(principal_id.0, app_id.0)
            .await
            .map_err(|e| match e {
                DbError::NotFound => {
                    tracing::debug!(session = %key, "No session to refresh");
                    AuthError::SessionNotFound
                }
                other => AuthError::from(other),
            })?;

        if !constant_time_str_eq(&session.refresh_token, presented) {
            tracing::warn!(
                session = %key,
                presented = %token_fingerprint(presented),
                "Superseded refresh token presented"
            );
            return Err(AuthError::StaleToken);
        }

        let pair = self.mint_pair(principal_id, &session.name, &session.email)?;
        self.repo
            .upsert(principal_id.0, app_id.0, &pair.refresh_token)
            .await?;

        tracing::info!(session = %key, "Refresh token rotated");
        Ok(pair)
    }

    /// End the session for (principal, app). Ending a missing session is not
    /// an error.
    pub async fn logout(&self, principal_id: PrincipalId, app_id: AppId) -> Result<(), AuthError> {
        self.repo.delete(principal_id.0, app_id.0).await?;
        tracing::info!(%principal_id, %app_id, "Session closed");
        Ok(())
    }

    /// End every session of a principal
    pub async fn logout_everywhere(&self, principal_id: PrincipalId) -> Result<u64, AuthError> {
        let removed = self.repo.delete_all_for_principal(principal_id.0).await?;
        tracing::info!(%principal_id, removed, "All sessions closed");
        Ok(removed)
    }

    /// List live sessions, most recently used first
    pub async fn active_sessions(
        &self,
        principal_id: PrincipalId,
    ) -> Result<Vec<ActiveSession>, AuthError> {
        let rows = self.repo.list_for_principal(principal_id.0).await?;
        Ok(rows
            .into_iter()
            .map(|row| ActiveSession {
                app_id: row.app_id(),
                updated_at: row.updated_at,
            })
            .collect())
    }

    /// Verify an access token. Pure; never consults the store.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.codec.decode(token)
    }

    /// Check the backing store is reachable
    pub async fn ping(&self) -> Result<(), AuthError> {
        self.repo.ping().await.map_err(AuthError::from)
    }

    fn mint_pair(
        &self,
        principal_id: PrincipalId,
        name: &str,
        email: &str,
    ) -> Result<TokenPair, AuthError> {
        let issuer = &self.config.issuer;
        let access = self.codec.encode(AccessClaims::new(
            issuer,
            principal_id,
            name,
            email,
            self.config.access_token_ttl,
        ))?;
        let refresh = self.codec.encode(RefreshClaims::new(
            issuer,
            principal_id,
            self.config.refresh_token_ttl,
        ))?;

        Ok(TokenPair::bearer(
            access,
            refresh,
            self.config.access_token_ttl.as_secs(),
        ))
    }
}

impl<R: SessionRepository + ?Sized> std::fmt::Debug for SessionManager<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("issuer", &self.config.issuer)
            .finish_non_exhaustive()
    }
}
