use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;

use super::errors::PasswordError;
use crate::config::HashingSettings;

/// Password hashing implementation.
///
/// Provides salted, memory-hard password hashing (internally uses Argon2id).
/// The work factor is fixed at construction and embedded in every hash it produces.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Create a new password hasher with the Argon2 default work factor.
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Create a password hasher with an explicit work factor.
    ///
    /// # Arguments
    /// * `settings` - Memory cost (KiB), iteration count and parallelism
    ///
    /// # Errors
    /// * `InvalidParameters` - Argon2 rejected the parameter combination
    pub fn with_settings(settings: &HashingSettings) -> Result<Self, PasswordError> {
        let params = Params::new(
            settings.memory_cost_kib,
            settings.iterations,
            settings.parallelism,
            None,
        )
        .map_err(|e| PasswordError::InvalidParameters(e.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password securely.
    ///
    /// Uses Argon2id with random salt generation, so hashing the same password
    /// twice yields two different strings.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// PHC string format hash (includes algorithm, parameters, salt, and hash)
    ///
    /// # Errors
    /// * `HashingFailed` - Password hashing operation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// Parameters are read from the stored hash, not from this hasher, so hashes
    /// produced under an older work factor keep verifying. The digest comparison
    /// is constant-time.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `hash` - Stored password hash in PHC string format
    ///
    /// # Returns
    /// True if password matches; false on mismatch or if `hash` is not a valid PHC string
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
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

    fn cheap_hasher() -> PasswordHasher {
        PasswordHasher::with_settings(&HashingSettings {
            memory_cost_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .expect("valid parameters")
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new();
        let password = "my_secure_password";

        let hash = hasher.hash(password).expect("Failed to hash password");

        assert!(hasher.verify(password, &hash));
        assert!(!hasher.verify("wrong_password", &hash));
    }

    #[test]
    fn test_hash_is_self_describing_and_not_plaintext() {
        let hasher = cheap_hasher();
        let hash = hasher.hash("Secret123").expect("Failed to hash password");

        assert_ne!(hash, "Secret123");
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("m=1024,t=1,p=1"));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = cheap_hasher();
        let first = hasher.hash("Secret123").expect("Failed to hash password");
        let second = hasher.hash("Secret123").expect("Failed to hash password");

        assert_ne!(first, second);
        assert!(hasher.verify("Secret123", &first));
        assert!(hasher.verify("Secret123", &second));
    }

    #[test]
    fn test_verify_distinct_passwords() {
        let hasher = cheap_hasher();
        let samples = ["a", "password", "Password", "correct horse battery", "ünïcödé"];

        for (i, stored) in samples.iter().enumerate() {
            let hash = hasher.hash(stored).expect("Failed to hash password");
            for (j, candidate) in samples.iter().enumerate() {
                assert_eq!(hasher.verify(candidate, &hash), i == j);
            }
        }
    }

    #[test]
    fn test_verify_uses_parameters_from_hash() {
        let strong = PasswordHasher::new();
        let hash = strong.hash("Secret123").expect("Failed to hash password");

        assert!(cheap_hasher().verify("Secret123", &hash));
    }

    #[test]
    fn test_verify_invalid_hash() {
        let hasher = PasswordHasher::new();
        assert!(!hasher.verify("password", "invalid_hash"));
        assert!(!hasher.verify("password", ""));
        assert!(!hasher.verify("password", "$argon2id$v=19$m=oops"));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let result = PasswordHasher::with_settings(&HashingSettings {
            memory_cost_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(PasswordError::InvalidParameters(_))));
    }
}
