//! Session model

use std::time::Instant;

/// Per-browser state for one visitor.
///
/// Each session owns its own copy; nothing here is shared between sessions,
/// so one visitor's cooldown never throttles another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Set once the access password has been verified
    pub authenticated: bool,
    /// When the last successful generation finished
    pub last_generation: Option<Instant>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget authentication and generation history (logout)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_locked() {
        let session = SessionState::new();
        assert!(!session.authenticated);
        assert!(session.last_generation.is_none());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = SessionState {
            authenticated: true,
            last_generation: Some(Instant::now()),
        };
        session.reset();
        assert_eq!(session, SessionState::new());
    }
}
