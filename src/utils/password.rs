use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::HashingConfig;
use crate::utils::error::AppError;

/// Salted password hashing backed by Argon2id.
///
/// Hashes are PHC strings (`$argon2id$v=19$...`) carrying their own salt and
/// cost parameters, so verification keeps working after the configured cost
/// changes.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    /// Hash at the configured cost that no account owns.
    placeholder: String,
}

impl CredentialHasher {
    pub fn new(config: &HashingConfig) -> Result<Self, AppError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| AppError::InternalServerError(format!("Invalid hashing parameters: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let placeholder = hash_with(&argon2, "partyfund-placeholder")?;

        Ok(Self {
            argon2,
            placeholder,
        })
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        hash_with(&self.argon2, plaintext)
    }

    /// A stored hash that does not parse never matches.
    pub fn verify(&self, stored: &str, plaintext: &str) -> bool {
        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Spends a full verification on a login for an unknown account, so it
    /// takes as long as a wrong password. Never matches.
    pub fn verify_unknown(&self, plaintext: &str) -> bool {
        let _ = self.verify(&self.placeholder, plaintext);
        false
    }
}

fn hash_with(argon2: &Argon2<'_>, plaintext: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}
