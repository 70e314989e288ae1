//! Hook Port - typed pre/post processing extension points.

use async_trait::async_trait;
use std::fmt;

use crate::domain::orchestration::{FinalResponse, RequestContext};
use crate::domain::trace::RequestScope;

/// Where in the pipeline a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// After the gate, before memory and routing.
    PreProcess,
    /// After aggregation and memory commit.
    PostProcess,
}

impl HookPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookPhase::PreProcess => "pre_process",
            HookPhase::PostProcess => "post_process",
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a hook gets to look at.
#[derive(Clone, Copy)]
pub struct HookArgs<'a> {
    pub prompt: &'a str,
    pub context: &'a RequestContext,
    pub scope: &'a RequestScope,
    /// The generated answer; present in `PostProcess` only.
    pub response: Option<&'a FinalResponse>,
}

/// Hook result: `handled` stops the remaining hooks of the phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookOutcome {
    pub handled: bool,
    pub result: Option<FinalResponse>,
}

impl HookOutcome {
    /// Let the next hook run.
    pub fn pass() -> Self {
        Self::default()
    }

    /// Stop the phase and hand back `result`.
    pub fn handled(result: FinalResponse) -> Self {
        Self {
            handled: true,
            result: Some(result),
        }
    }
}

#[async_trait]
pub trait Hook: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, phase: HookPhase, args: HookArgs<'_>) -> Result<HookOutcome, HookError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("hook failed: {0}")]
pub struct HookError(pub String);
