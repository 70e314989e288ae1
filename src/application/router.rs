//! DomainRouter - picks the primary domain and splits the prompt into subtasks.
//!
//! Both operations always produce a usable answer: strategy failures are
//! downgraded to warnings on the request scope.

use serde_json::json;
use std::sync::Arc;

use crate::domain::foundation::SubtaskId;
use crate::domain::memory::ComposedMemory;
use crate::domain::routing::{DomainTag, Subtask};
use crate::domain::trace::RequestScope;
use crate::ports::{DecomposedPart, DetectionInput, DomainDetector, TaskDecomposer};

pub struct DomainRouter {
    detector: Arc<dyn DomainDetector>,
    decomposer: Arc<dyn TaskDecomposer>,
    registered: Vec<DomainTag>,
    history_window: usize,
}

impl DomainRouter {
    /// `registered` is the set of routable domains; `General` is always added.
    pub fn new(
        detector: Arc<dyn DomainDetector>,
        decomposer: Arc<dyn TaskDecomposer>,
        registered: impl IntoIterator<Item = DomainTag>,
        history_window: usize,
    ) -> Self {
        let mut registered: Vec<DomainTag> = registered.into_iter().collect();
        registered.push(DomainTag::General);
        registered.sort();
        registered.dedup();

        Self {
            detector,
            decomposer,
            registered,
            history_window,
        }
    }

    pub fn registered(&self) -> &[DomainTag] {
        &self.registered
    }

    fn accepts(&self, tag: DomainTag) -> bool {
        self.registered.contains(&tag)
    }

    /// Domain recent history leans towards, if it is routable.
    fn history_preference(&self, memory: &ComposedMemory) -> Option<DomainTag> {
        memory
            .session()
            .dominant_domain(self.history_window)
            .filter(|tag| self.accepts(*tag))
    }

    /// Returns exactly one routable domain.
    ///
    /// Ties between top-scoring candidates go to the domain dominating
    /// recent history; with no usable candidates at all, history decides
    /// before falling back to `General`.
    pub async fn detect(
        &self,
        prompt: &str,
        memory: &ComposedMemory,
        multimodal_summary: Option<&str>,
        scope: &RequestScope,
    ) -> DomainTag {
        let input = DetectionInput {
            prompt,
            memory,
            multimodal_summary,
            registered: &self.registered,
        };

        let candidates = match self.detector.detect(input).await {
            Ok(candidates) => candidates,
            Err(e) => {
                scope.warn(format!("domain detection failed, using general: {}", e));
                scope.record("router.detected", json!({ "domain": "general", "via": "fallback" }));
                return DomainTag::General;
            }
        };

        let mut scored: Vec<(DomainTag, f32)> = Vec::new();
        let mut rejected: Vec<String> = Vec::new();
        for candidate in &candidates {
            match candidate.label.parse::<DomainTag>() {
                Ok(tag) if self.accepts(tag) => scored.push((tag, candidate.score)),
                _ => rejected.push(candidate.label.clone()),
            }
        }

        if scored.is_empty() {
            if !rejected.is_empty() {
                scope.warn(format!(
                    "detector returned unroutable domain(s) {:?}, using general",
                    rejected
                ));
                scope.record("router.detected", json!({ "domain": "general", "via": "fallback" }));
                return DomainTag::General;
            }
            let tag = self.history_preference(memory).unwrap_or(DomainTag::General);
            scope.record("router.detected", json!({ "domain": tag, "via": "history" }));
            return tag;
        }

        let top = scored
            .iter()
            .map(|(_, score)| *score)
            .fold(f32::NEG_INFINITY, f32::max);
        let mut tied: Vec<DomainTag> = scored
            .iter()
            .filter(|(_, score)| *score >= top)
            .map(|(tag, _)| *tag)
            .collect();
        tied.sort();
        tied.dedup();

        let (tag, via) = match tied.as_slice() {
            [only] => (*only, "detector"),
            _ => match self.history_preference(memory).filter(|h| tied.contains(h)) {
                Some(preferred) => (preferred, "history_tiebreak"),
                None => (tied[0], "detector"),
            },
        };

        scope.record(
            "router.detected",
            json!({ "domain": tag, "via": via, "candidates": candidates.len() }),
        );
        tag
    }

    /// Splits the prompt into one or more subtasks.
    ///
    /// Parts whose domain hint is unknown or unroutable inherit `domain`.
    pub async fn decompose(
        &self,
        prompt: &str,
        domain: DomainTag,
        memory: &ComposedMemory,
        scope: &RequestScope,
    ) -> Vec<Subtask> {
        let parts = match self.decomposer.decompose(prompt, domain, memory).await {
            Ok(parts) if !parts.is_empty() => parts,
            Ok(_) => {
                scope.warn("decomposition returned no subtasks, using whole prompt");
                return self.single(prompt, domain, scope);
            }
            Err(e) => {
                scope.warn(format!("decomposition failed, using whole prompt: {}", e));
                return self.single(prompt, domain, scope);
            }
        };

        let subtasks: Vec<Subtask> = parts
            .into_iter()
            .enumerate()
            .map(|(i, part)| self.to_subtask(i, part, prompt, domain))
            .collect();

        scope.record(
            "router.decomposed",
            json!({
                "count": subtasks.len(),
                "domains": subtasks.iter().map(|s| s.domain()).collect::<Vec<_>>(),
            }),
        );
        subtasks
    }

    fn to_subtask(&self, index: usize, part: DecomposedPart, prompt: &str, fallback: DomainTag) -> Subtask {
        let domain = part
            .domain_hint
            .as_deref()
            .and_then(|hint| hint.parse::<DomainTag>().ok())
            .filter(|tag| self.accepts(*tag))
            .unwrap_or(fallback);
        Subtask::new(SubtaskId::new(index as u32 + 1), domain, part.content, prompt)
    }

    fn single(&self, prompt: &str, domain: DomainTag, scope: &RequestScope) -> Vec<Subtask> {
        scope.record("router.decomposed", json!({ "count": 1, "domains": [domain], "via": "fallback" }));
        vec![Subtask::whole_prompt(prompt, domain)]
    }
}
