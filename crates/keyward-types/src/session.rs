//! Session and token types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppId, PrincipalId};

/// Composite key of a session: one live session per (principal, app)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub principal_id: PrincipalId,
    pub app_id: AppId,
}

impl SessionKey {
    pub fn new(principal_id: PrincipalId, app_id: AppId) -> Self {
        Self {
            principal_id,
            app_id,
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.principal_id, self.app_id)
    }
}

/// A live session as shown to its owner; the refresh token is never exposed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub app_id: AppId,
    /// Last login or refresh
    pub updated_at: DateTime<Utc>,
}

/// Token pair returned after login, signup, or refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token (short-lived)
    pub access_token: String,
    /// Refresh token (long-lived)
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
    /// Token type (always "Bearer")
    pub token_type: String,
}

impl TokenPair {
    /// Create a bearer token pair
    pub fn bearer(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: u64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_in,
            token_type: "Bearer".to_string(),
        }
    }
}

/// Identifier of a parked token pair, handed to the client after login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandoffId(pub Uuid);

impl HandoffId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for HandoffId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HandoffId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token pair collected by the app it was issued for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffTokens {
    pub principal_id: PrincipalId,
    pub app_id: AppId,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_pair_serializes_token_type() {
        let pair = TokenPair::bearer("a.b.c", "d.e.f", 900);
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["token_type"], "Bearer");
        assert_eq!(json["expires_in"], 900);
    }

    #[test]
    fn test_session_key_display() {
        let key = SessionKey::new(PrincipalId::new(), AppId::new());
        let shown = key.to_string();
        assert!(shown.contains(&key.principal_id.to_string()));
        assert!(shown.ends_with(&key.app_id.to_string()));
    }

    #[test]
    fn test_handoff_tokens_flatten_pair() {
        let handoff = HandoffTokens {
            principal_id: PrincipalId::new(),
            app_id: AppId::new(),
            tokens: TokenPair::bearer("a.b.c", "d.e.f", 900),
        };
        let json = serde_json::to_value(&handoff).unwrap();
        assert_eq!(json["refresh_token"], "d.e.f");
        assert_eq!(json["app_id"], handoff.app_id.to_string());
    }
}
