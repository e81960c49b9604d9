//! Port for turning plaintext passwords into stored digests.

use crate::domain::PasswordHash;

/// Hashes and verifies user credentials.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    /// Digest `plaintext` for storage.
    fn hash(&self, plaintext: &str) -> PasswordHash;

    /// Whether `plaintext` matches `stored`.
    fn verify(&self, plaintext: &str, stored: &PasswordHash) -> bool;
}
