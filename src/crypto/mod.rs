//! Credential hashing and session token generation.
//!
//! Passwords are hashed with Argon2id using cost factors taken from the
//! configuration at construction time. Verification goes through the
//! argon2 crate's `PasswordVerifier`, which compares digests in constant
//! time. Session tokens are 32 random bytes, hex-encoded, and carry no
//! embedded meaning.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use anyhow::Result;
use rand::Rng;

use crate::config::AuthConfig;

/// Stateless password hasher/verifier. Safe to share across requests.
#[derive(Clone)]
pub struct CredentialVerifier {
    argon2: Argon2<'static>,
}

impl CredentialVerifier {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let params = Params::new(
            config.hash_memory_kib,
            config.hash_iterations,
            config.hash_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid password hashing parameters: {}", e))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password with a freshly generated salt
    pub fn hash(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash
    pub fn verify(&self, hash: &str, password: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Generate a random session token
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_verifier() -> CredentialVerifier {
        // Minimal cost factors; production values come from config
        CredentialVerifier::new(&AuthConfig {
            hash_memory_kib: 8,
            hash_iterations: 1,
            hash_parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let verifier = test_verifier();
        let hash = verifier.hash("123456").unwrap();
        assert_ne!(hash, "123456");
        assert!(verifier.verify(&hash, "123456"));
        assert!(!verifier.verify(&hash, "wrong"));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        let verifier = test_verifier();
        assert!(!verifier.verify("not-a-phc-string", "123456"));
        assert!(!verifier.verify("", "123456"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let verifier = test_verifier();
        let a = verifier.hash("123456").unwrap();
        let b = verifier.hash("123456").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_token() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }
}
