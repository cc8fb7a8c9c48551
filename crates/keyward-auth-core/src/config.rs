//! Configuration types for auth service

use std::time::Duration;

/// Auth service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Value of the `iss` claim on every minted token
    pub issuer: String,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
    /// Password reset token lifetime
    pub password_reset_ttl: Duration,
    /// Minimum accepted password length in characters
    pub min_password_length: usize,
    /// How long a parked token pair waits for its app to collect it
    pub handoff_ttl: Duration,
}

impl AuthConfig {
    /// Create a new auth config with default lifetimes
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            access_token_ttl: Duration::from_secs(15 * 60),        // 15 minutes
            refresh_token_ttl: Duration::from_secs(5 * 24 * 60 * 60), // 5 days
            password_reset_ttl: Duration::from_secs(60 * 60),       // 1 hour
            min_password_length: 8,
            handoff_ttl: Duration::from_secs(5 * 60),                // 5 minutes
        }
    }

    /// Set access token lifetime
    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    /// Set refresh token lifetime
    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    /// Set password reset token lifetime
    pub fn with_password_reset_ttl(mut self, ttl: Duration) -> Self {
        self.password_reset_ttl = ttl;
        self
    }

    /// Set minimum password length
    pub fn with_min_password_length(mut self, len: usize) -> Self {
        self.min_password_length = len;
        self
    }

    /// Set how long a token handoff can wait to be collected
    pub fn with_handoff_ttl(mut self, ttl: Duration) -> Self {
        self.handoff_ttl = ttl;
        self
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new("keyward")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lifetimes() {
        let config = AuthConfig::default();
        assert_eq!(config.issuer, "keyward");
        assert_eq!(config.access_token_ttl.as_secs(), 900);
        assert_eq!(config.refresh_token_ttl.as_secs(), 432_000);
        assert_eq!(config.password_reset_ttl.as_secs(), 3600);
        assert_eq!(config.handoff_ttl.as_secs(), 300);
    }

    #[test]
    fn test_builders_override() {
        let config = AuthConfig::new("issuer-x")
            .with_access_token_ttl(Duration::from_secs(60))
            .with_refresh_token_ttl(Duration::from_secs(120))
            .with_min_password_length(12);
        assert_eq!(config.issuer, "issuer-x");
        assert_eq!(config.access_token_ttl.as_secs(), 60);
        assert_eq!(config.refresh_token_ttl.as_secs(), 120);
        assert_eq!(config.min_password_length, 12);
    }
}
