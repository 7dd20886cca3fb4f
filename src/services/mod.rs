//! Services layer - Business logic
//!
//! This module contains the generation request pipeline and its parts:
//! - Credential gate (shared password check)
//! - Rate gate (per-session cooldown)
//! - Prompt normalizer
//! - Image generation client
//! - Session store

pub mod credential;
pub mod generation;
pub mod image_client;
pub mod prompt;
pub mod rate_limiter;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use credential::{hash_secret, CredentialError, CredentialGate};
pub use generation::{GenerationService, PipelineError};
pub use image_client::{GenerationError, ImageClient, ImageGenerator};
pub use prompt::{normalize, MAX_PROMPT_CHARS};
pub use rate_limiter::{allow, RateDecision, RateGate, DEFAULT_COOLDOWN};
pub use session::{SessionHandle, SessionStore};
