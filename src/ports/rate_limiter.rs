//! Rate limiting port.
//!
//! Implementations count admitted requests per user over a sliding window and
//! must serialize updates for the same user without a process-wide lock.

use async_trait::async_trait;

use crate::domain::foundation::UserId;

/// Per-user request admission.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Admit one request for `user`, recording it when admitted.
    async fn check(&self, user: &UserId) -> Result<RateDecision, RateLimitError>;

    /// Usage of the current window without recording a request.
    async fn usage(&self, user: &UserId) -> Result<WindowUsage, RateLimitError>;
}

/// Outcome of [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Admitted(WindowUsage),
    /// The window is full; the oldest request leaves it after `retry_after_ms`.
    Limited { limit: u32, retry_after_ms: u64 },
}

impl RateDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, RateDecision::Admitted(_))
    }
}

/// Requests counted in the trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowUsage {
    pub limit: u32,
    pub used: u32,
}

impl WindowUsage {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}
