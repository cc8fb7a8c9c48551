//! Signing keys and comparison primitives
//!
//! The RSA keypair is loaded once at startup and shared read-only by every
//! request. Loading verifies that the two halves belong together, so a
//! misconfigured deployment fails before it mints a single token.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// The only algorithm tokens are signed or accepted with
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::RS256;

const SELF_CHECK_MESSAGE: &[u8] = b"keyward-keypair-check";

/// RSA signing keypair.
///
/// Cheap to clone; the parsed keys sit behind `Arc`.
#[derive(Clone)]
pub struct RsaKeyPair {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    public_pem: Arc<str>,
}

impl RsaKeyPair {
    /// Build a keypair from PEM text.
    ///
    /// Expects a PKCS#1 private key and a PKCS#1 or SPKI public key.
    ///
    /// # Errors
    /// Returns error if either half fails to parse, or if a test signature
    /// made with the private half does not verify under the public half.
    pub fn from_pem(
        private_pem: impl AsRef<[u8]>,
        public_pem: impl AsRef<[u8]>,
    ) -> Result<Self, KeyError> {
        let encoding = EncodingKey::from_rsa_pem(private_pem.as_ref())
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem.as_ref())
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        let public_text = std::str::from_utf8(public_pem.as_ref())
            .map_err(|_| KeyError::InvalidPublicKey("PEM is not valid UTF-8".to_string()))?;

        let pair = Self {
            encoding: Arc::new(encoding),
            decoding: Arc::new(decoding),
            public_pem: Arc::from(public_text.trim()),
        };
        pair.self_check()?;
        Ok(pair)
    }

    /// Read both halves from disk and build the keypair
    pub fn from_pem_files(
        private_path: impl AsRef<Path>,
        public_path: impl AsRef<Path>,
    ) -> Result<Self, KeyError> {
        let private_pem = read_key_file(private_path.as_ref())?;
        let public_pem = read_key_file(public_path.as_ref())?;
        Self::from_pem(private_pem, public_pem)
    }

    fn self_check(&self) -> Result<(), KeyError> {
        let signature = jsonwebtoken::crypto::sign(SELF_CHECK_MESSAGE, &self.encoding, SIGNING_ALGORITHM)
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
        let verified = jsonwebtoken::crypto::verify(
            &signature,
            SELF_CHECK_MESSAGE,
            &self.decoding,
            SIGNING_ALGORITHM,
        )
        .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;

        if verified {
            Ok(())
        } else {
            Err(KeyError::Mismatch)
        }
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }

    /// Public half as PEM, for publishing to verifiers
    pub fn public_key_pem(&self) -> &str {
        &self.public_pem
    }
}

impl std::fmt::Debug for RsaKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaKeyPair")
            .field("algorithm", &SIGNING_ALGORITHM)
            .finish_non_exhaustive()
    }
}

fn read_key_file(path: &Path) -> Result<Vec<u8>, KeyError> {
    std::fs::read(path).map_err(|source| KeyError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Errors that can occur when loading the signing keypair
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("invalid RSA private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid RSA public key: {0}")]
    InvalidPublicKey(String),

    #[error("RSA public key does not match private key")]
    Mismatch,

    #[error("failed to read key file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Constant-time byte slice comparison.
///
/// Length is not secret: slices of different length compare unequal
/// immediately.
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Constant-time string comparison.
#[inline]
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

/// Short SHA-256 fingerprint of a token, safe to put in logs.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..8])
}
