//! Bearer-token session validation.

use crate::error::{ApiError, ApiResult};
use sha2::{Digest, Sha256};

/// A validated caller identity.
///
/// There are no role distinctions: any valid session is fully privileged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque subject the token resolved to.
    pub subject: String,
}

/// Resolves opaque bearer tokens into sessions.
pub trait SessionValidator: Send + Sync {
    /// Validates a presented token.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when the token is not recognized.
    fn validate(&self, token: &str) -> ApiResult<Session>;
}

/// Validator for a single operator API token fixed at startup.
///
/// Holds only the SHA-256 digest of the token and compares digests with
/// a constant-time fold, so neither memory dumps nor timing expose the
/// token itself.
pub struct StaticTokenValidator {
    digest: [u8; 32],
}

impl StaticTokenValidator {
    /// Creates a validator accepting exactly the given token.
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self {
            digest: Sha256::digest(token.as_bytes()).into(),
        }
    }
}

impl SessionValidator for StaticTokenValidator {
    fn validate(&self, token: &str) -> ApiResult<Session> {
        let presented: [u8; 32] = Sha256::digest(token.as_bytes()).into();
        let mut diff = 0u8;
        for (a, b) in presented.iter().zip(self.digest.iter()) {
            diff |= a ^ b;
        }
        if diff != 0 {
            return Err(ApiError::Unauthenticated);
        }
        Ok(Session {
            subject: "api-token".to_string(),
        })
    }
}
