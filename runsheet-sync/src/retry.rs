//! Bounded retry for individual cell writes.

use std::fmt;
use std::thread::sleep;
use std::time::Duration;

use crate::config::{CELL_RETRY_DELAY, CELL_WRITE_ATTEMPTS};

/// Delay between two attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately.
    None,
    /// Wait the same amount before every retry.
    Fixed(Duration),
}

impl Backoff {
    pub fn delay(&self) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(d) => *d,
        }
    }
}

/// How many times an operation is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; `1` disables retrying.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    /// One retry after a fixed delay.
    fn default() -> Self {
        Self {
            max_attempts: CELL_WRITE_ATTEMPTS,
            backoff: Backoff::Fixed(CELL_RETRY_DELAY),
        }
    }
}

/// The last error of an operation that failed on every attempt.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub error: E,
}

impl RetryPolicy {
    /// Same attempt count as the default, without sleeping.
    pub fn immediate() -> Self {
        Self {
            backoff: Backoff::None,
            ..Self::default()
        }
    }

    /// Single attempt.
    pub fn never() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::None,
        }
    }

    /// Run `op` until it succeeds or the attempts are used up.
    pub fn run<T, E: fmt::Display>(
        &self,
        mut op: impl FnMut() -> Result<T, E>,
    ) -> Result<T, Exhausted<E>> {
        let max = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(error) if attempt >= max => {
                    return Err(Exhausted {
                        attempts: attempt,
                        error,
                    })
                }
                Err(error) => {
                    let delay = self.backoff.delay();
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "store write failed; retrying"
                    );
                    if !delay.is_zero() {
                        sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}
