//! RequestGate - safety screening and per-user rate limiting.
//!
//! Safety runs first, so a denylisted prompt never consumes rate quota and
//! never reaches a downstream component.

use serde_json::json;
use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::orchestration::Rejection;
use crate::domain::trace::RequestScope;
use crate::ports::{ContentClassifier, RateDecision, RateLimiter, SafetyVerdict};

pub struct RequestGate {
    classifier: Arc<dyn ContentClassifier>,
    limiter: Arc<dyn RateLimiter>,
}

impl RequestGate {
    pub fn new(classifier: Arc<dyn ContentClassifier>, limiter: Arc<dyn RateLimiter>) -> Self {
        Self { classifier, limiter }
    }

    /// Admits or rejects one request.
    ///
    /// A classifier outage rejects the request (fail closed). A rate limiter
    /// outage admits it with a warning (fail open).
    pub async fn admit(
        &self,
        user_id: &UserId,
        prompt: &str,
        scope: &RequestScope,
    ) -> Result<(), Rejection> {
        let verdict = match self.classifier.classify(prompt).await {
            Ok(verdict) => verdict,
            Err(e) => {
                scope.error(format!("safety classifier failed: {}", e));
                SafetyVerdict::Unsafe {
                    reason: "safety check unavailable".to_string(),
                }
            }
        };

        if let SafetyVerdict::Unsafe { reason } = verdict {
            tracing::warn!(user_id = %user_id, reason = %reason, "prompt rejected as unsafe");
            scope.record("gate.rejected", json!({ "check": "safety" }));
            return Err(Rejection::UnsafeContent { reason });
        }

        match self.limiter.check(user_id).await {
            Ok(RateDecision::Admitted(usage)) => {
                scope.record(
                    "gate.admitted",
                    json!({ "remaining": usage.remaining(), "limit": usage.limit }),
                );
                Ok(())
            }
            Ok(RateDecision::Limited {
                limit,
                retry_after_ms,
            }) => {
                tracing::warn!(
                    user_id = %user_id,
                    limit,
                    retry_after_ms,
                    "rate limit exceeded"
                );
                scope.record(
                    "gate.rejected",
                    json!({ "check": "rate_limit", "retry_after_ms": retry_after_ms }),
                );
                Err(Rejection::RateLimited { retry_after_ms })
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "rate limiter unavailable, admitting");
                scope.warn(format!("rate limiter unavailable, admitting request: {}", e));
                scope.record("gate.admitted", json!({ "rate_limit": "skipped" }));
                Ok(())
            }
        }
    }
}
