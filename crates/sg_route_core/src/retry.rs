use std::time::Duration;

use crate::error::EngineResult;

/// Bounded retry with exponential backoff for the blocking collaborators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub initial_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or the
    /// attempts are used up. The last error is returned.
    pub fn run<T, F>(&self, what: &str, mut op: F) -> EngineResult<T>
    where
        F: FnMut() -> EngineResult<T>,
    {
        let attempts = self.max_attempts.max(1);
        let mut backoff = self.initial_backoff;

        let mut attempt = 1;
        loop {
            match op() {
                Ok(v) => return Ok(v),
                Err(e) if attempt < attempts && e.is_transient() => {
                    tracing::debug!(
                        "{what}: attempt {attempt}/{attempts} failed ({e}), retrying in {:?}",
                        backoff
                    );
                    if !backoff.is_zero() {
                        std::thread::sleep(backoff);
                    }
                    backoff = backoff.mul_f64(self.multiplier.max(1.0));
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
