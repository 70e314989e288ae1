//! HookPipeline - ordered extension points around the core pipeline.

use futures::FutureExt;
use serde_json::json;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use crate::config::HooksConfig;
use crate::ports::{Hook, HookArgs, HookOutcome, HookPhase};

/// Hooks keyed by phase, run in registration order.
///
/// The first hook reporting `handled` ends the phase. A hook that errors,
/// panics or exceeds the per-hook timeout is logged and skipped.
pub struct HookPipeline {
    hooks: HashMap<HookPhase, Vec<Arc<dyn Hook>>>,
    timeout: Duration,
}

impl HookPipeline {
    pub fn new(timeout: Duration) -> Self {
        Self {
            hooks: HashMap::new(),
            timeout,
        }
    }

    pub fn from_config(config: &HooksConfig) -> Self {
        Self::new(config.handler_timeout())
    }

    pub fn register(mut self, phase: HookPhase, hook: Arc<dyn Hook>) -> Self {
        self.hooks.entry(phase).or_default().push(hook);
        self
    }

    pub fn len(&self, phase: HookPhase) -> usize {
        self.hooks.get(&phase).map_or(0, Vec::len)
    }

    pub async fn run(&self, phase: HookPhase, args: HookArgs<'_>) -> HookOutcome {
        let Some(hooks) = self.hooks.get(&phase) else {
            return HookOutcome::pass();
        };

        for hook in hooks {
            let guarded = AssertUnwindSafe(hook.run(phase, args)).catch_unwind();
            let failure = match tokio::time::timeout(self.timeout, guarded).await {
                Ok(Ok(Ok(outcome))) if outcome.handled => {
                    args.scope.record(
                        "hooks.handled",
                        json!({ "phase": phase.as_str(), "hook": hook.name() }),
                    );
                    return outcome;
                }
                Ok(Ok(Ok(_))) => continue,
                Ok(Ok(Err(e))) => e.to_string(),
                Ok(Err(_)) => "panicked".to_string(),
                Err(_) => format!("timed out after {}ms", self.timeout.as_millis()),
            };

            tracing::warn!(
                request_id = %args.scope.request_id(),
                hook = hook.name(),
                phase = %phase,
                reason = %failure,
                "hook failed, skipping"
            );
            args.scope
                .warn(format!("hook '{}' ({}) skipped: {}", hook.name(), phase, failure));
        }

        HookOutcome::pass()
    }
}
