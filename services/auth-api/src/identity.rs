//! Verification of external identity provider credentials

use async_trait::async_trait;
use keyward_auth_core::AuthError;
use keyward_types::{AuthProvider, ExternalIdentity};

/// Exchanges a provider credential (an ID token, an auth code) for a
/// verified identity
#[async_trait]
pub trait ExternalIdentityVerifier: Send + Sync {
    async fn verify(
        &self,
        provider: AuthProvider,
        credential: &str,
    ) -> Result<ExternalIdentity, AuthError>;
}

/// Used when no provider is configured; every credential is refused
#[derive(Debug, Default, Clone, Copy)]
pub struct RejectingVerifier;

#[async_trait]
impl ExternalIdentityVerifier for RejectingVerifier {
    async fn verify(
        &self,
        provider: AuthProvider,
        _credential: &str,
    ) -> Result<ExternalIdentity, AuthError> {
        tracing::debug!(%provider, "External login attempted with no verifier configured");
        Err(AuthError::InvalidCredentials)
    }
}
