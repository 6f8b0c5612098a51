//! Credential collaborator: password hashing and verification.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{CanteenError, CanteenResult};

/// Hashes and verifies passwords on behalf of the account handlers.
pub trait Credentials: Send + Sync {
    /// Produces an opaque, self-describing hash of `password`.
    fn hash(&self, password: &str) -> CanteenResult<String>;
    /// True when `password` matches `hash`. Malformed hashes never match.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2id with the crate's default parameters and a random salt.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Credentials;

impl Credentials for Argon2Credentials {
    fn hash(&self, password: &str) -> CanteenResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| CanteenError::Credential(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let creds = Argon2Credentials;
        let hash = creds.hash("pw1").expect("hash");
        assert_ne!(hash, "pw1");
        assert!(creds.verify("pw1", &hash));
        assert!(!creds.verify("pw2", &hash));
        assert!(!creds.verify("pw1", "not-a-phc-string"));
    }
}
