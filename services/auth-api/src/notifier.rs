//! Delivery of password reset tokens

use async_trait::async_trait;
use keyward_auth_core::token_fingerprint;

/// Hands a freshly minted reset token to whatever delivers it to the user
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn password_reset_requested(&self, email: &str, token: &str);
}

/// Records that a reset was requested; delivery happens elsewhere
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl ResetNotifier for LogNotifier {
    async fn password_reset_requested(&self, _email: &str, token: &str) {
        tracing::info!(
            token = %token_fingerprint(token),
            "Password reset requested; no delivery channel configured"
        );
    }
}
