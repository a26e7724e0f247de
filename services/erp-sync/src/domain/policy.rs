use chrono::{DateTime, Duration, Utc};

use crate::domain::types::Transition;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BACKOFF_SECS: [u64; 5] = [30, 120, 600, 1800, 3600];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidRetryPolicy {
    #[error("max_attempts must be at least 1")]
    NoAttempts,
    #[error("backoff schedule must not be empty")]
    EmptyBackoff,
    #[error("backoff of {0}s is out of range")]
    BackoffOutOfRange(u64),
}

/// Attempt ceiling and fixed (non-randomized) backoff schedule for transient failures.
///
/// The k-th transient failure (1-based) waits `backoff[k - 1]`; failures past
/// the end of the table reuse the last entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF_SECS
                .iter()
                .map(|&secs| Duration::seconds(secs as i64))
                .collect(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Vec<Duration>) -> Result<Self, InvalidRetryPolicy> {
        if max_attempts == 0 {
            return Err(InvalidRetryPolicy::NoAttempts);
        }
        if backoff.is_empty() {
            return Err(InvalidRetryPolicy::EmptyBackoff);
        }
        Ok(Self {
            max_attempts,
            backoff,
        })
    }

    pub fn from_secs(max_attempts: u32, backoff_secs: &[u64]) -> Result<Self, InvalidRetryPolicy> {
        let backoff = backoff_secs
            .iter()
            .map(|&secs| {
                i64::try_from(secs)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .ok_or(InvalidRetryPolicy::BackoffOutOfRange(secs))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(max_attempts, backoff)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay scheduled after the given (1-based) attempt failed transiently.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let index = (attempt.max(1) - 1) as usize;
        self.backoff[index.min(self.backoff.len() - 1)]
    }

    /// Outcome of a transient failure on a row that has now made `attempts` attempts.
    pub fn after_transient_failure(
        &self,
        attempts: u32,
        error: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Transition {
        if attempts >= self.max_attempts {
            return Transition::dead(error, now);
        }
        Transition::retry(error, now, now + self.backoff_for(attempts))
    }
}
