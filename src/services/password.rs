// src/services/password.rs
use tokio::task;

use crate::error::{ApiError, ApiResult};

const BCRYPT_COST: u32 = 10;

/// Runs on the blocking pool.
pub async fn hash_password(password: String) -> ApiResult<String> {
    task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
        .map_err(ApiError::from)
}

/// False for a wrong password and for a hash that cannot be parsed.
pub async fn verify_password(password: String, password_hash: String) -> bool {
    task::spawn_blocking(move || bcrypt::verify(password, &password_hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn verifies_only_the_original_password() {
        let hash = hash_password("ChangeMe123!".to_string()).await.unwrap();
        assert_ne!(hash, "ChangeMe123!");
        assert!(verify_password("ChangeMe123!".to_string(), hash.clone()).await);
        assert!(!verify_password("changeme123!".to_string(), hash).await);
    }

    #[tokio::test]
    async fn malformed_hash_never_verifies() {
        assert!(!verify_password("x".to_string(), "not-a-bcrypt-hash".to_string()).await);
    }
}
