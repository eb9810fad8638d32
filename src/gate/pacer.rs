//! Login Pacer
//!
//! Linear backoff between consecutive login attempts within one run.

use std::time::Duration;

/// Hands out the pause to take before each login attempt.
///
/// The n-th attempt (counting from zero) waits `n * base`.
#[derive(Debug, Clone)]
pub struct LoginPacer {
    base: Duration,
    attempts_since_pause: u32,
}

impl LoginPacer {
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            attempts_since_pause: 0,
        }
    }

    /// Returns the pause for the next attempt and counts the attempt.
    ///
    /// Saturates at `Duration::MAX`.
    pub fn next_pause(&mut self) -> Duration {
        let pause = self
            .base
            .checked_mul(self.attempts_since_pause)
            .unwrap_or(Duration::MAX);
        self.attempts_since_pause = self.attempts_since_pause.saturating_add(1);
        pause
    }

    pub fn attempts(&self) -> u32 {
        self.attempts_since_pause
    }
}
