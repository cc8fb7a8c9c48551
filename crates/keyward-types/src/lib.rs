//! Keyward Types - Shared domain types
//!
//! This crate contains domain types used across Keyward crates:
//! - Principal and client application identifiers
//! - Token pairs handed back to callers, directly or through a handoff
//! - Verified identities from external providers

pub mod auth;
pub mod principal;
pub mod session;

pub use auth::*;
pub use principal::*;
pub use session::*;
