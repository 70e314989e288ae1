//! In-memory sliding-window rate limiter.
//!
//! Each key keeps the instants of its admitted requests. A request is
//! admitted when fewer than `limit` instants fall inside the trailing
//! window. Updates for one key go through that key's map entry, so
//! unrelated keys never contend.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::GateConfig;
use crate::domain::foundation::UserId;
use crate::ports::{RateDecision, RateLimitError, RateLimiter, WindowUsage};

/// Sliding-window limiter for single-process deployments.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    limit: u32,
    window: Duration,
    windows: DashMap<UserId, VecDeque<Instant>>,
}

impl InMemoryRateLimiter {
    /// Create a limiter admitting `limit` requests per `window`.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
        }
    }

    /// Create a limiter from gate settings.
    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.request_limit, config.window())
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Drop instants that have left the window.
    fn evict(&self, hits: &mut VecDeque<Instant>, now: Instant) {
        while hits
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= self.window)
        {
            hits.pop_front();
        }
    }

    fn usage_of(&self, used: usize) -> WindowUsage {
        WindowUsage {
            limit: self.limit,
            used: used as u32,
        }
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, user: &UserId) -> Result<RateDecision, RateLimitError> {
        let now = Instant::now();
        let mut hits = self.windows.entry(user.clone()).or_default();
        self.evict(&mut hits, now);

        if hits.len() as u32 >= self.limit {
            let wait = hits
                .front()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.window);
            return Ok(RateDecision::Limited {
                limit: self.limit,
                retry_after_ms: (wait.as_millis() as u64).max(1),
            });
        }

        hits.push_back(now);
        Ok(RateDecision::Admitted(self.usage_of(hits.len())))
    }

    async fn usage(&self, user: &UserId) -> Result<WindowUsage, RateLimitError> {
        let now = Instant::now();
        let used = match self.windows.get_mut(user) {
            Some(mut hits) => {
                self.evict(&mut hits, now);
                hits.len()
            }
            None => 0,
        };
        Ok(self.usage_of(used))
    }
}
