//! Clause-splitting decomposer.

use async_trait::async_trait;

use crate::domain::memory::ComposedMemory;
use crate::domain::routing::rules::{score_domains, split_clauses};
use crate::domain::routing::DomainTag;
use crate::ports::{DecomposedPart, RoutingError, TaskDecomposer};

/// Splits compound prompts on sentence and "and <verb>" boundaries and tags
/// each clause with its best keyword domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleDecomposer;

impl RuleDecomposer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TaskDecomposer for RuleDecomposer {
    async fn decompose(
        &self,
        prompt: &str,
        _domain: DomainTag,
        _memory: &ComposedMemory,
    ) -> Result<Vec<DecomposedPart>, RoutingError> {
        Ok(split_clauses(prompt)
            .into_iter()
            .map(|clause| {
                let hint = score_domains(&clause).first().map(|(tag, _)| *tag);
                let part = DecomposedPart::new(clause);
                match hint {
                    Some(tag) => part.with_hint(tag.as_str()),
                    None => part,
                }
            })
            .collect())
    }
}
