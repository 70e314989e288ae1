//! Subtask: one atomic unit of work derived from a user prompt.

use serde::{Deserialize, Serialize};

use super::DomainTag;
use crate::domain::foundation::SubtaskId;

/// An atomic unit of work routed to exactly one domain handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    id: SubtaskId,
    domain: DomainTag,
    content: String,
    originating_prompt: String,
}

impl Subtask {
    pub fn new(
        id: SubtaskId,
        domain: DomainTag,
        content: impl Into<String>,
        originating_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id,
            domain,
            content: content.into(),
            originating_prompt: originating_prompt.into(),
        }
    }

    /// The single-subtask form: the whole prompt, tagged with `domain`.
    pub fn whole_prompt(prompt: &str, domain: DomainTag) -> Self {
        Self::new(SubtaskId::new(1), domain, prompt, prompt)
    }

    pub fn id(&self) -> SubtaskId {
        self.id
    }

    pub fn domain(&self) -> DomainTag {
        self.domain
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn originating_prompt(&self) -> &str {
        &self.originating_prompt
    }

    /// Returns a copy routed to another domain.
    pub fn rerouted(&self, domain: DomainTag) -> Self {
        Self {
            domain,
            ..self.clone()
        }
    }
}
