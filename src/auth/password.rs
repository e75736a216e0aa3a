use crate::auth::{AuthError, ValidationError};

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// Salted adaptive hashing (bcrypt).
///
/// `hash` produces a self-contained `$2b$` digest carrying cost and a fresh
/// salt; `verify` reads both back out of the digest. Both calls are CPU
/// bound, so async callers should go through `hash_blocking` /
/// `verify_blocking`.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_COST, MAX_COST),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Inputs longer than bcrypt's 72-byte window are refused rather than
    /// silently truncated.
    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        bcrypt::non_truncating_hash(plaintext, self.cost).map_err(|e| match e {
            bcrypt::BcryptError::Truncation(bytes) => {
                AuthError::Validation(ValidationError::PasswordTooLong { bytes })
            }
            other => AuthError::Hashing(other.to_string()),
        })
    }

    /// Malformed digests and over-long inputs verify as `false`, same as a
    /// wrong password.
    pub fn verify(&self, digest: &str, plaintext: &str) -> bool {
        match bcrypt::non_truncating_verify(plaintext, digest) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::debug!("digest rejected by bcrypt: {}", e);
                false
            }
        }
    }

    pub async fn hash_blocking(&self, plaintext: &str) -> Result<String, AuthError> {
        let hasher = *self;
        let plaintext = plaintext.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    pub async fn verify_blocking(&self, digest: &str, plaintext: &str) -> bool {
        let hasher = *self;
        let digest = digest.to_owned();
        let plaintext = plaintext.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&digest, &plaintext))
            .await
            .unwrap_or(false)
    }
}

/// Whether a stored secret already looks like a bcrypt digest.
pub fn is_bcrypt_digest(secret: &str) -> bool {
    secret.len() == 60
        && ["$2a$", "$2b$", "$2x$", "$2y$"]
            .iter()
            .any(|prefix| secret.starts_with(prefix))
}
