//! SHA-256 credential hasher.
//!
//! Digests are lowercase hex, matching accounts created by earlier releases
//! of the app.
//
// TODO: move to a salted, slow KDF once existing digests can be migrated on
// next login.

use sha2::{Digest, Sha256};

use crate::domain::PasswordHash;
use crate::domain::ports::CredentialHasher;

/// Hex-encoded SHA-256 of the plaintext.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256CredentialHasher;

impl Sha256CredentialHasher {
    fn digest(plaintext: &str) -> String {
        hex::encode(Sha256::digest(plaintext.as_bytes()))
    }
}

impl CredentialHasher for Sha256CredentialHasher {
    fn hash(&self, plaintext: &str) -> PasswordHash {
        PasswordHash::from_hex_digest(Self::digest(plaintext))
    }

    fn verify(&self, plaintext: &str, stored: &PasswordHash) -> bool {
        Self::digest(plaintext).eq_ignore_ascii_case(stored.as_ref())
    }
}
