//! RSA keypairs checked in as fixtures

use keyward_auth_core::RsaKeyPair;

pub const SIGNING_PRIVATE_PEM: &str = include_str!("../fixtures/signing_private.pem");
pub const SIGNING_PUBLIC_PEM: &str = include_str!("../fixtures/signing_public.pem");
pub const FOREIGN_PRIVATE_PEM: &str = include_str!("../fixtures/foreign_private.pem");
pub const FOREIGN_PUBLIC_PEM: &str = include_str!("../fixtures/foreign_public.pem");

/// The keypair the code under test signs with
pub fn signing_keys() -> RsaKeyPair {
    RsaKeyPair::from_pem(SIGNING_PRIVATE_PEM, SIGNING_PUBLIC_PEM).unwrap()
}

/// An unrelated keypair, for forging tokens
#[allow(dead_code)]
pub fn foreign_keys() -> RsaKeyPair {
    RsaKeyPair::from_pem(FOREIGN_PRIVATE_PEM, FOREIGN_PUBLIC_PEM).unwrap()
}
