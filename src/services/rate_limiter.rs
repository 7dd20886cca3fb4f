//! Rate gate for image generation
//!
//! Enforces a minimum interval between two generations in the same session.
//! The check is a pure function of the clock reading, the session's last
//! generation time and the cooldown; callers thread the session state through.

use std::time::{Duration, Instant};

/// Default interval between two generations
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10);

/// Outcome of a rate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The request may proceed
    Allowed,
    /// The request must wait this much longer
    Wait(Duration),
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }

    /// Remaining wait, zero when allowed
    pub fn remaining(&self) -> Duration {
        match self {
            RateDecision::Allowed => Duration::ZERO,
            RateDecision::Wait(remaining) => *remaining,
        }
    }

    /// Remaining wait in whole seconds, rounded up.
    ///
    /// A request that is still blocked never reports 0 seconds.
    pub fn wait_seconds(&self) -> u64 {
        ceil_seconds(self.remaining())
    }
}

pub(crate) fn ceil_seconds(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Decide whether a generation at `now` is allowed after one at `last`.
pub fn allow(now: Instant, last: Option<Instant>, cooldown: Duration) -> RateDecision {
    let Some(last) = last else {
        return RateDecision::Allowed;
    };

    // A `last` in the future (clock skew between callers) counts as zero elapsed
    let elapsed = now.saturating_duration_since(last);
    if elapsed >= cooldown {
        RateDecision::Allowed
    } else {
        RateDecision::Wait(cooldown - elapsed)
    }
}

/// Rate gate with a fixed cooldown
#[derive(Debug, Clone, Copy)]
pub struct RateGate {
    cooldown: Duration,
}

impl RateGate {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn check(&self, now: Instant, last: Option<Instant>) -> RateDecision {
        allow(now, last, self.cooldown)
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}
