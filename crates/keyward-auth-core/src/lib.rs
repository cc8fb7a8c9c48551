//! Keyward Auth Core - Token lifecycle business logic
//!
//! RS256 token issuance and verification, access/refresh pairing, and the
//! per-(principal, app) session rotation protocol.

pub mod config;
pub mod crypto;
pub mod error;
pub mod handoff;
pub mod password;
pub mod service;
pub mod session;
pub mod token;

pub use config::*;
pub use crypto::{constant_time_eq, constant_time_str_eq, token_fingerprint, KeyError, RsaKeyPair};
pub use error::*;
pub use handoff::*;
pub use service::*;
pub use session::*;
pub use token::*;
