//! RS256 token encoding and verification
//!
//! Every token carries a `sub` claim naming its purpose. The claim set is a
//! tagged enum on the wire, so a refresh token can never be read back as an
//! access token or the other way round.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Header, Validation};
use keyward_types::PrincipalId;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::crypto::{RsaKeyPair, SIGNING_ALGORITHM};
use crate::AuthError;

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Access,
    Refresh,
    PasswordReset,
}

impl std::fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
            Self::PasswordReset => write!(f, "password_reset"),
        }
    }
}

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub iss: String,
    pub jti: String,
    pub principal_id: PrincipalId,
    pub name: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    pub fn new(
        issuer: &str,
        principal_id: PrincipalId,
        name: impl Into<String>,
        email: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        let (iat, exp) = validity_window(ttl);
        Self {
            iss: issuer.to_string(),
            jti: Uuid::new_v4().to_string(),
            principal_id,
            name: name.into(),
            email: email.into(),
            iat,
            exp,
        }
    }
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub iss: String,
    pub jti: String,
    pub principal_id: PrincipalId,
    pub iat: i64,
    pub exp: i64,
}

impl RefreshClaims {
    pub fn new(issuer: &str, principal_id: PrincipalId, ttl: Duration) -> Self {
        let (iat, exp) = validity_window(ttl);
        Self {
            iss: issuer.to_string(),
            jti: Uuid::new_v4().to_string(),
            principal_id,
            iat,
            exp,
        }
    }
}

/// Claims carried by a password reset token
///
/// `credential` fingerprints the password hash current at issue time. Once
/// the password changes the token no longer matches and is refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetClaims {
    pub iss: String,
    pub jti: String,
    pub email: String,
    pub credential: String,
    pub iat: i64,
    pub exp: i64,
}

impl PasswordResetClaims {
    pub fn new(
        issuer: &str,
        email: impl Into<String>,
        credential: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        let (iat, exp) = validity_window(ttl);
        Self {
            iss: issuer.to_string(),
            jti: Uuid::new_v4().to_string(),
            email: email.into(),
            credential: credential.into(),
            iat,
            exp,
        }
    }
}

/// The wire form of every token body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "sub", rename_all = "snake_case")]
pub enum Claims {
    Access(AccessClaims),
    Refresh(RefreshClaims),
    PasswordReset(PasswordResetClaims),
}

impl Claims {
    pub fn purpose(&self) -> TokenPurpose {
        match self {
            Self::Access(_) => TokenPurpose::Access,
            Self::Refresh(_) => TokenPurpose::Refresh,
            Self::PasswordReset(_) => TokenPurpose::PasswordReset,
        }
    }
}

/// A claim shape that can be pulled out of a decoded [`Claims`]
pub trait TokenClaims: Sized + Into<Claims> {
    const PURPOSE: TokenPurpose;

    fn from_claims(claims: Claims) -> Option<Self>;
}

macro_rules! token_claims {
    ($ty:ident, $variant:ident) => {
        impl From<$ty> for Claims {
            fn from(claims: $ty) -> Self {
                Claims::$variant(claims)
            }
        }

        impl TokenClaims for $ty {
            const PURPOSE: TokenPurpose = TokenPurpose::$variant;

            fn from_claims(claims: Claims) -> Option<Self> {
                match claims {
                    Claims::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

token_claims!(AccessClaims, Access);
token_claims!(RefreshClaims, Refresh);
token_claims!(PasswordResetClaims, PasswordReset);

fn validity_window(ttl: Duration) -> (i64, i64) {
    let iat = Utc::now().timestamp();
    let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    (iat, iat.saturating_add(ttl))
}

/// Signs and verifies tokens with one RSA keypair
///
/// Verification pins the algorithm to RS256, requires `exp`, `iss` and
/// `sub`, checks the issuer, and allows no clock leeway.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    keys: RsaKeyPair,
    issuer: String,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(keys: RsaKeyPair, issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            keys,
            issuer,
            validation,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn keys(&self) -> &RsaKeyPair {
        &self.keys
    }

    /// Sign a claim set into a compact JWS
    pub fn encode(&self, claims: impl Into<Claims>) -> Result<String, AuthError> {
        let claims = claims.into();
        jsonwebtoken::encode(
            &Header::new(SIGNING_ALGORITHM),
            &claims,
            self.keys.encoding_key(),
        )
        .map_err(|e| {
            tracing::error!(error = %e, purpose = %claims.purpose(), "Failed to sign token");
            AuthError::Signing(e.to_string())
        })
    }

    /// Verify a token and extract the claim shape `T`.
    ///
    /// A token of any other purpose is rejected as malformed.
    pub fn decode<T: TokenClaims>(&self, token: &str) -> Result<T, AuthError> {
        let expected = T::PURPOSE;
        let data = jsonwebtoken::decode::<Claims>(token, self.keys.decoding_key(), &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, %expected, "Token rejected");
                match classify(e.kind()) {
                    AuthError::MalformedClaims if declares_foreign_algorithm(token) => {
                        AuthError::InvalidSignature
                    }
                    other => other,
                }
            })?;

        let actual = data.claims.purpose();
        T::from_claims(data.claims).ok_or_else(|| {
            tracing::debug!(%expected, %actual, "Token purpose mismatch");
            AuthError::MalformedClaims
        })
    }
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::InvalidRsaKey(_) => AuthError::InvalidSignature,
        _ => AuthError::MalformedClaims,
    }
}

/// True when the header names an algorithm other than RS256.
///
/// Headers such as `"alg":"none"` fail to parse before any signature check,
/// so they are recognised here rather than reported as malformed.
fn declares_foreign_algorithm(token: &str) -> bool {
    let Some(header) = token.split('.').next() else {
        return false;
    };
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(header) else {
        return false;
    };
    let Ok(header) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
        return false;
    };
    header
        .get("alg")
        .and_then(|alg| alg.as_str())
        .is_some_and(|alg| alg != "RS256")
}
