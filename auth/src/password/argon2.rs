use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use super::errors::PasswordError;

// Random salt and digest under the default Argon2id cost. No password
// matches it, but verifying against it does the full amount of work.
const DECOY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$FqSDHuhIgiP/2vfRslivXg$oGRLbDGwhQDoPZ8XA82A69aHHAjH7w7wz/qXVGgcmYk";

/// Password hashing implementation (Argon2id, default parameters).
///
/// Hashes are PHC strings, so salt and cost travel with the hash and
/// verification needs nothing else. Digest comparison is done by
/// `PasswordVerifier`, which compares in constant time.
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    // Verified against when the account does not exist, so a login for an
    // unknown username costs the same as a wrong password.
    decoy_hash: Option<PasswordHash<'static>>,
}

impl PasswordHasher {
    /// Create a new password hasher instance.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
            decoy_hash: PasswordHash::new(DECOY_HASH).ok(),
        }
    }

    /// Hash a plaintext password securely.
    ///
    /// # Errors
    /// * `HashingFailed` - Salt generation or hashing failed; never falls back
    ///   to a weaker hash
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// # Returns
    /// True if password matches, false otherwise
    ///
    /// # Errors
    /// * `VerificationFailed` - Stored hash is not a valid PHC string
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            PasswordError::VerificationFailed(format!("Invalid password hash: {}", e))
        })?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Burn the same work as a real verification without a real hash.
    ///
    /// Always returns false.
    pub fn verify_decoy(&self, password: &str) -> bool {
        if let Some(decoy) = &self.decoy_hash {
            let _ = self.argon2.verify_password(password.as_bytes(), decoy);
        }
        false
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new();
        let password = "my_secure_password";

        let hash = hasher.hash(password).expect("Failed to hash password");
        assert!(hash.starts_with("$argon2id$"));

        assert!(hasher
            .verify(password, &hash)
            .expect("Failed to verify password"));

        assert!(!hasher
            .verify("wrong_password", &hash)
            .expect("Failed to verify password"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = PasswordHasher::new();

        let first = hasher.hash("same_password").unwrap();
        let second = hasher.hash("same_password").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("same_password", &first).unwrap());
        assert!(hasher.verify("same_password", &second).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash() {
        let hasher = PasswordHasher::new();
        let result = hasher.verify("password", "invalid_hash");
        assert!(matches!(result, Err(PasswordError::VerificationFailed(_))));
    }

    #[test]
    fn test_decoy_costs_the_same_as_a_real_hash() {
        let hasher = PasswordHasher::new();
        let decoy = hasher.decoy_hash.as_ref().expect("decoy hash must parse");
        let real = hasher.hash("password").unwrap();
        let real = PasswordHash::new(&real).unwrap();

        assert_eq!(decoy.algorithm, real.algorithm);
        assert_eq!(decoy.version, real.version);
        assert_eq!(decoy.params.to_string(), real.params.to_string());
        assert_eq!(decoy.hash.map(|h| h.len()), real.hash.map(|h| h.len()));
    }

    #[test]
    fn test_verify_decoy_never_matches() {
        let hasher = PasswordHasher::new();
        assert!(!hasher.verify_decoy("decoy-password"));
        assert!(!hasher.verify_decoy("anything"));
    }
}
