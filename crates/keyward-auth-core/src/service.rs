//! Auth service - ties together principals, passwords, and sessions

use keyward_db::{CreatePrincipal, DbError, PrincipalRepository, PrincipalRow, SessionRepository};
use keyward_types::{ActiveSession, AppId, ExternalIdentity, Principal, PrincipalId, TokenPair};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    crypto::RsaKeyPair,
    password,
    session::SessionManager,
    token::{AccessClaims, PasswordResetClaims},
    AuthError,
};

/// Result of a successful signup or login
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub principal: Principal,
    pub tokens: TokenPair,
}

/// A reset token and the normalized address it was minted for
#[derive(Debug, Clone)]
pub struct PasswordReset {
    pub email: String,
    pub token: String,
}

/// New principal registration
#[derive(Debug, Clone)]
pub struct Signup {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Authentication service
///
/// Generic over the repositories so callers can pick concrete types or
/// `dyn` trait objects.
pub struct AuthService<P, S>
where
    P: PrincipalRepository + ?Sized,
    S: SessionRepository + ?Sized,
{
    config: AuthConfig,
    sessions: SessionManager<S>,
    principals: Arc<P>,
}

impl<P, S> AuthService<P, S>
where
    P: PrincipalRepository + ?Sized,
    S: SessionRepository + ?Sized,
{
    /// Create a new auth service
    pub fn new(
        config: AuthConfig,
        keys: RsaKeyPair,
        principals: Arc<P>,
        session_repo: Arc<S>,
    ) -> Self {
        Self {
            sessions: SessionManager::new(keys, config.clone(), session_repo),
            principals,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// PEM public key for external verifiers
    pub fn public_key_pem(&self) -> &str {
        self.sessions.codec().keys().public_key_pem()
    }

    // =========================================================================
    // Registration and login
    // =========================================================================

    /// Register a principal with a password and log it in
    pub async fn signup(
        &self,
        signup: Signup,
        app_id: Option<AppId>,
    ) -> Result<Authenticated, AuthError> {
        let email = normalize_email(&signup.email)?;
        if signup.password.is_empty() {
            return Err(AuthError::InvalidInput("password is required".to_string()));
        }
        password::validate_password_strength(&signup.password, self.config.min_password_length)?;

        let password_hash = password::hash_password(&signup.password)?;
        let row = self
            .principals
            .create(CreatePrincipal {
                id: Uuid::new_v4(),
                name: display_name(&signup.name, &email),
                email,
                password_hash: Some(password_hash),
            })
            .await?;

        let principal = row.to_principal();
        tracing::info!(principal_id = %principal.id, "Principal registered");

        let tokens = self.sessions.issue_for_login(&principal, app_id).await?;
        Ok(Authenticated { principal, tokens })
    }

    /// Log in with email and password
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        app_id: Option<AppId>,
    ) -> Result<Authenticated, AuthError> {
        // Every failure below costs one Argon2 verification
        let row = match normalize_email(email) {
            Ok(email) => self.principals.find_by_email(&email).await?,
            Err(_) => None,
        };

        let Some(row) = row else {
            password::verify_without_hash(password);
            tracing::debug!("Login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !check_password(&row, password) {
            tracing::debug!(principal_id = %row.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let principal = row.to_principal();
        let tokens = self.sessions.issue_for_login(&principal, app_id).await?;
        Ok(Authenticated { principal, tokens })
    }

    /// Log in with an identity already verified by an external provider.
    ///
    /// Creates a password-less principal on first sight of the email.
    pub async fn login_external(
        &self,
        identity: ExternalIdentity,
        app_id: Option<AppId>,
    ) -> Result<Authenticated, AuthError> {
        let email = normalize_email(&identity.email)?;

        let row = match self.principals.find_by_email(&email).await? {
            Some(row) => row,
            None => {
                let created = self
                    .principals
                    .create(CreatePrincipal {
                        id: Uuid::new_v4(),
                        name: display_name(&identity.name, &email),
                        email: email.clone(),
                        password_hash: None,
                    })
                    .await;

                match created {
                    Ok(row) => {
                        tracing::info!(
                            principal_id = %row.id,
                            provider = %identity.provider,
                            "Principal registered from external identity"
                        );
                        row
                    }
                    // Lost a race with a concurrent first login
                    Err(DbError::Conflict(_)) => self
                        .principals
                        .find_by_email(&email)
                        .await?
                        .ok_or(AuthError::InvalidCredentials)?,
                    Err(e) => return Err(e.into()),
                }
            }
        };

        let principal = row.to_principal();
        let tokens = self.sessions.issue_for_login(&principal, app_id).await?;
        Ok(Authenticated { principal, tokens })
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    pub async fn refresh(
        &self,
        refresh_token: &str,
        principal_id: PrincipalId,
        app_id: AppId,
    ) -> Result<TokenPair, AuthError> {
        self.sessions.refresh(refresh_token, principal_id, app_id).await
    }

    pub async fn logout(&self, principal_id: PrincipalId, app_id: AppId) -> Result<(), AuthError> {
        self.sessions.logout(principal_id, app_id).await
    }

    pub async fn logout_everywhere(&self, principal_id: PrincipalId) -> Result<u64, AuthError> {
        self.sessions.logout_everywhere(principal_id).await
    }

    pub async fn active_sessions(
        &self,
        principal_id: PrincipalId,
    ) -> Result<Vec<ActiveSession>, AuthError> {
        self.sessions.active_sessions(principal_id).await
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.sessions.verify_access(token)
    }

    /// Readiness of the backing stores
    pub async fn ping(&self) -> Result<(), AuthError> {
        self.sessions.ping().await
    }

    // =========================================================================
    // Passwords
    // =========================================================================

    /// Change the password of a logged-in principal
    pub async fn change_password(
        &self,
        principal_id: PrincipalId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let row = self
            .principals
            .find_by_id(principal_id.0)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !check_password(&row, old_password) {
            tracing::debug!(%principal_id, "Password change with wrong current password");
            return Err(AuthError::InvalidCredentials);
        }
        password::validate_password_strength(new_password, self.config.min_password_length)?;

        self.store_password(principal_id, new_password).await?;
        tracing::info!(%principal_id, "Password changed");
        Ok(())
    }

    /// Mint a reset token for `email`.
    ///
    /// Returns `None` for an unknown email; callers must respond the same
    /// way in both cases. Unknown emails still pay for a signature.
    pub async fn begin_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<PasswordReset>, AuthError> {
        let Ok(email) = normalize_email(email) else {
            return Ok(None);
        };
        let row = self.principals.find_by_email(&email).await?;

        let credential = password::credential_fingerprint(
            row.as_ref().and_then(|row| row.password_hash.as_deref()),
        );
        let claims = PasswordResetClaims::new(
            &self.config.issuer,
            email.clone(),
            credential,
            self.config.password_reset_ttl,
        );
        let token = self.sessions.codec().encode(claims)?;

        let Some(row) = row else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(None);
        };

        tracing::info!(principal_id = %row.id, "Password reset token issued");
        Ok(Some(PasswordReset { email, token }))
    }

    /// Set a new password with a reset token and end every session.
    ///
    /// A token is good for one reset: once the password changes its
    /// credential fingerprint no longer matches.
    pub async fn complete_password_reset(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let claims: PasswordResetClaims = self.sessions.codec().decode(token)?;
        let email = normalize_email(email)?;
        if claims.email != email {
            tracing::debug!("Reset token presented for a different email");
            return Err(AuthError::MalformedClaims);
        }

        let row = self
            .principals
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::MalformedClaims)?;

        let current = password::credential_fingerprint(row.password_hash.as_deref());
        if current != claims.credential {
            tracing::warn!(principal_id = %row.id, "Reset token already used or superseded");
            return Err(AuthError::StaleToken);
        }
        password::validate_password_strength(new_password, self.config.min_password_length)?;

        let principal_id = row.principal_id();
        self.store_password(principal_id, new_password).await?;
        let revoked = self.sessions.logout_everywhere(principal_id).await?;

        tracing::info!(%principal_id, revoked, "Password reset completed");
        Ok(())
    }

    async fn store_password(
        &self,
        principal_id: PrincipalId,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let hash = password::hash_password(new_password)?;
        self.principals
            .update_password_hash(principal_id.0, &hash)
            .await
            .map_err(|e| match e {
                DbError::NotFound => AuthError::InvalidCredentials,
                other => other.into(),
            })
    }
}

/// Principals from external identities have no password and never verify
fn check_password(row: &PrincipalRow, password: &str) -> bool {
    match row.password_hash.as_deref() {
        Some(hash) => password::verify_password(password, hash),
        None => password::verify_without_hash(password),
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AuthError::InvalidInput("email is required".to_string()));
    }
    if !email.contains('@') {
        return Err(AuthError::InvalidInput("email is invalid".to_string()));
    }
    Ok(email)
}

fn display_name(name: &str, email: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        email.split('@').next().unwrap_or(email).to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
        assert!(matches!(normalize_email("   "), Err(AuthError::InvalidInput(_))));
        assert!(matches!(normalize_email("nope"), Err(AuthError::InvalidInput(_))));
    }

    #[test]
    fn test_display_name_falls_back_to_local_part() {
        assert_eq!(display_name("  ", "ada@example.com"), "ada");
        assert_eq!(display_name(" Ada ", "ada@example.com"), "Ada");
    }
}
