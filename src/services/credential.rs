//! Credential gate
//!
//! The application is unlocked with one shared password. Only its SHA-256
//! hex digest is configured (`APP_PASSWORD`); candidates are hashed the same
//! way and compared in constant time.
//!
//! Without a configured digest the gate fails closed.

use sha2::{Digest, Sha256};

use crate::models::SessionState;

/// Error types for the credential gate
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CredentialError {
    /// No password hash was configured
    #[error("APP_PASSWORD is not configured; access is disabled")]
    NotConfigured,
}

/// SHA-256 of `secret`, as lowercase hex.
pub fn hash_secret(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    format!("{:x}", digest)
}

/// Byte comparison whose running time depends only on the input lengths.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Verifies candidate passwords against the configured digest.
#[derive(Debug, Clone)]
pub struct CredentialGate {
    configured_hash: Option<String>,
}

impl CredentialGate {
    /// Create a gate from the configured digest.
    ///
    /// Surrounding whitespace is ignored and hex is compared
    /// case-insensitively. A blank value counts as not configured.
    pub fn new(configured_hash: Option<String>) -> Self {
        let configured_hash = configured_hash
            .map(|hash| hash.trim().to_ascii_lowercase())
            .filter(|hash| !hash.is_empty());
        Self { configured_hash }
    }

    pub fn is_configured(&self) -> bool {
        self.configured_hash.is_some()
    }

    /// Check `candidate` and unlock `session` on a match.
    ///
    /// Returns `Ok(false)` for a wrong password, leaving the session as it
    /// was. Retrying is allowed immediately.
    pub fn check(
        &self,
        session: &mut SessionState,
        candidate: &str,
    ) -> Result<bool, CredentialError> {
        let expected = self
            .configured_hash
            .as_deref()
            .ok_or(CredentialError::NotConfigured)?;

        let actual = hash_secret(candidate);
        if constant_time_eq(actual.as_bytes(), expected.as_bytes()) {
            session.authenticated = true;
            tracing::info!("Access password accepted");
            Ok(true)
        } else {
            tracing::warn!("Incorrect access password");
            Ok(false)
        }
    }
}
