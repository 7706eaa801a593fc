//! Per-session request allowance for the hosted classification model.

use thiserror::Error;

pub const DEFAULT_MAX_REQUESTS_PER_SESSION: u32 = 5;

/// Returned once a session has used its whole allowance.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "You've reached the maximum number of requests ({max}). \
     To use this model in your work, please contact {contact}"
)]
pub struct RateLimitExceeded {
    pub max: u32,
    pub contact: String,
}

/// Counts classification attempts within one session.
///
/// The counter is incremented before the model is called, so failed
/// provider calls still consume an attempt.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max: u32,
    used: u32,
    contact: String,
}

impl RateLimiter {
    pub fn new(max: u32, contact: impl Into<String>) -> Self {
        Self {
            max,
            used: 0,
            contact: contact.into(),
        }
    }

    /// Consume one attempt. Returns the allowance left afterwards.
    pub fn try_acquire(&mut self) -> Result<u32, RateLimitExceeded> {
        if self.used >= self.max {
            return Err(RateLimitExceeded {
                max: self.max,
                contact: self.contact.clone(),
            });
        }
        self.used += 1;
        Ok(self.remaining())
    }

    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS_PER_SESSION, "the maintainers")
    }
}
