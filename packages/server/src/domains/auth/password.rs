//! Credential hashing.
//!
//! bcrypt with cost 12. Hashing happens before a user record ever reaches a
//! store; stores never see plaintext. Credential changes go through
//! `UserStore::update_credential`, not a generic save.

use anyhow::{Context, Result};

const BCRYPT_COST: u32 = 12;

/// Hash a plaintext credential.
pub fn hash_password(plain: &str) -> Result<String> {
    bcrypt::hash(plain, BCRYPT_COST).context("Failed to hash credential")
}

/// Verify a plaintext credential against a stored hash.
///
/// Returns `Ok(false)` on mismatch; `Err` only if the stored hash is
/// malformed.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(plain, hash).context("Failed to verify credential")
}

#[cfg(test)]
mod tests {
    use super::*;

    // Lower cost in tests to keep the suite fast.
    fn quick_hash(plain: &str) -> String {
        bcrypt::hash(plain, 4).unwrap()
    }

    #[test]
    fn correct_password_matches() {
        let hash = quick_hash("Password1");
        assert!(verify_password("Password1", &hash).unwrap());
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = quick_hash("Password1");
        assert!(!verify_password("Password2", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("Password1", "not-a-bcrypt-hash").is_err());
    }
}
