//! Password hashing.

use thiserror::Error;

/// Default bcrypt cost when none is configured.
pub const DEFAULT_COST: u32 = 10;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password must be at least {0} characters")]
    TooShort(usize),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

const MIN_PASSWORD_LEN: usize = 8;

/// Hash a plaintext password with bcrypt.
pub fn hash_password(plain: &str, cost: u32) -> Result<String, PasswordError> {
    if plain.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort(MIN_PASSWORD_LEN));
    }
    bcrypt::hash(plain, cost).map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check a plaintext password against a stored hash.
///
/// A malformed stored hash counts as a non-match rather than an error, so
/// login failures never leak storage details to the caller.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cost 4 is the bcrypt minimum; production cost makes tests crawl.
    const TEST_COST: u32 = 4;

    #[test]
    fn hash_then_verify_accepts_correct_password() {
        let hash = hash_password("correct horse battery", TEST_COST).unwrap();
        assert!(verify_password("correct horse battery", &hash));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("correct horse battery", TEST_COST).unwrap();
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn short_password_is_rejected_before_hashing() {
        assert!(matches!(
            hash_password("short", TEST_COST).unwrap_err(),
            PasswordError::TooShort(_)
        ));
    }

    #[test]
    fn malformed_stored_hash_is_a_non_match() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }
}
