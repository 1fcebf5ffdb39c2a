/// Password Hashing and Verification
///
/// bcrypt with a fresh random salt per hash and a fixed cost. Strength rules
/// live in the validators; this module only hashes and compares.

use bcrypt::{hash, verify};

use crate::error::AppError;

pub const HASH_COST: u32 = 10;

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error if bcrypt hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, HASH_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// # Errors
/// Returns error if the stored hash cannot be parsed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// `hash_password` on the blocking thread pool
pub async fn spawn_hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

/// `verify_password` on the blocking thread pool
pub async fn spawn_verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "longpass1";
        let hash = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
        assert!(hash.contains("$10$"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("longpass1").unwrap();
        let second = hash_password("longpass1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("longpass1").unwrap();

        assert!(verify_password("longpass1", &hash).unwrap());
        assert!(!verify_password("longpass2", &hash).unwrap());
    }

    #[test]
    fn test_verify_against_garbage_hash() {
        assert!(verify_password("longpass1", "not-a-bcrypt-hash").is_err());
    }

    #[tokio::test]
    async fn test_blocking_pool_variants() {
        let hash = spawn_hash_password("longpass1".to_string()).await.unwrap();
        assert!(spawn_verify_password("longpass1".to_string(), hash.clone()).await.unwrap());
        assert!(!spawn_verify_password("nope-nope".to_string(), hash).await.unwrap());
    }
}
