//! Credential verification seam.

/// Checks a secret against the hash stored for a student.
///
/// Implementations must return `false` for hashes they cannot parse
/// rather than panicking.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, secret: &str, stored_hash: &str) -> bool;
}
