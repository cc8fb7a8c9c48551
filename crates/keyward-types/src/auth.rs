//! Authentication types

use serde::{Deserialize, Serialize};

/// External identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Google Sign-In
    Google,
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Google => write!(f, "google"),
        }
    }
}

/// Identity already verified by an external provider.
///
/// Token exchange with the provider happens outside this service; by the
/// time one of these exists, the email is trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    pub provider: AuthProvider,
    pub email: String,
    pub name: String,
}

impl ExternalIdentity {
    pub fn new(provider: AuthProvider, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            provider,
            email: email.into(),
            name: name.into(),
        }
    }
}
