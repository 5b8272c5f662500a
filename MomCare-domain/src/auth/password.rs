//! Argon2 password hashing

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use tracing::error;

use super::token::SecurityError;

/// Hash a password into a PHC string with a random salt
pub fn hash_password(password: &str) -> Result<String, SecurityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            SecurityError::PasswordHash(e.to_string())
        })
}

/// Check a password against a stored PHC string
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, SecurityError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        error!("Stored password hash is malformed: {}", e);
        SecurityError::PasswordHash(e.to_string())
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("patient123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("patient123", &hash).unwrap());
        assert!(!verify_password("patient124", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("x", "not-a-hash"),
            Err(SecurityError::PasswordHash(_))
        ));
    }
}
