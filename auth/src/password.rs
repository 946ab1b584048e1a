//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`),
//! so the cost parameters travel with each hash and older hashes keep
//! verifying after the configured cost changes.

use crate::error::{AuthError, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

const SALT_LEN: usize = 16;

/// Hash a password with a fresh random salt.
///
/// CPU and memory bound; call from a blocking context.
///
/// # Errors
///
/// Returns [`AuthError::InternalError`] if the cost parameters are out of
/// range for Argon2.
pub fn hash_password(password: &str, memory_kib: u32, iterations: u32) -> Result<String> {
    let params = Params::new(memory_kib, iterations, 1, None).map_err(|e| {
        tracing::error!(error = %e, memory_kib, iterations, "Invalid Argon2 parameters");
        AuthError::InternalError
    })?;

    let mut bytes = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    let salt = SaltString::encode_b64(&bytes).map_err(|e| {
        tracing::error!(error = %e, "Failed to encode password salt");
        AuthError::InternalError
    })?;

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing failed");
            AuthError::InternalError
        })
}

/// Check a password against a stored PHC hash.
///
/// Malformed hashes never verify.
#[must_use]
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(encoded) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const MIN_MEMORY_KIB: u32 = 8;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("caramel42", MIN_MEMORY_KIB, 1).unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=8,t=1,p=1$"), "{hash}");
        assert!(verify_password("caramel42", &hash));
        assert!(!verify_password("caramel43", &hash));
    }

    #[test]
    fn test_salt_differs_per_hash() {
        assert_ne!(
            hash_password("caramel42", MIN_MEMORY_KIB, 1).unwrap(),
            hash_password("caramel42", MIN_MEMORY_KIB, 1).unwrap()
        );
    }

    #[test]
    fn test_cost_travels_with_hash() {
        let cheap = hash_password("caramel42", MIN_MEMORY_KIB, 1).unwrap();
        let dearer = hash_password("caramel42", 64, 2).unwrap();
        assert!(dearer.contains("m=64,t=2,p=1"), "{dearer}");
        assert!(verify_password("caramel42", &cheap));
        assert!(verify_password("caramel42", &dearer));
    }

    #[test]
    fn test_out_of_range_cost_is_internal_error() {
        assert_eq!(
            hash_password("caramel42", 1, 1).unwrap_err(),
            AuthError::InternalError
        );
        assert_eq!(
            hash_password("caramel42", MIN_MEMORY_KIB, 0).unwrap_err(),
            AuthError::InternalError
        );
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        for encoded in [
            "",
            "$argon2id$",
            "sha256$16$AAAA$AAAA",
            "$argon2id$v=19$m=8,t=1,p=1$not-base64!$AAAA",
        ] {
            assert!(!verify_password("anything", encoded), "{encoded}");
        }
    }
}
