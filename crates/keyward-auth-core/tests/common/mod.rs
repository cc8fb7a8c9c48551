//! Common test utilities for keyward-auth-core integration tests

pub mod keys;
pub mod repos;

#[allow(unused_imports)]
pub use keys::{foreign_keys, signing_keys};
#[allow(unused_imports)]
pub use repos::{seed_principal, FlakySessionRepository};
