//! Long-term user memory.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::foundation::UserId;
use crate::domain::routing::DomainTag;

/// Pattern key holding per-domain usage counts.
pub const DOMAIN_COUNTS_KEY: &str = "domain_counts";

/// Preferences, learned patterns and a rolling summary of past requests.
///
/// Survives across sessions. Only `apply` mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    user_id: UserId,
    #[serde(default)]
    preferences: BTreeMap<String, String>,
    #[serde(default)]
    learned_patterns: BTreeMap<String, Value>,
    #[serde(default)]
    summarized_history: Vec<String>,
}

/// Changes to merge into a `UserProfile`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDelta {
    pub preferences: BTreeMap<String, String>,
    pub learned_patterns: BTreeMap<String, Value>,
    pub summaries: Vec<String>,
    /// Increments `learned_patterns["domain_counts"][domain]`.
    pub domain_used: Option<DomainTag>,
}

impl ProfileDelta {
    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
            && self.learned_patterns.is_empty()
            && self.summaries.is_empty()
            && self.domain_used.is_none()
    }
}

impl UserProfile {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            preferences: BTreeMap::new(),
            learned_patterns: BTreeMap::new(),
            summarized_history: Vec::new(),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn preferences(&self) -> &BTreeMap<String, String> {
        &self.preferences
    }

    pub fn learned_patterns(&self) -> &BTreeMap<String, Value> {
        &self.learned_patterns
    }

    pub fn summarized_history(&self) -> &[String] {
        &self.summarized_history
    }

    /// How many committed turns were routed to `domain`.
    pub fn domain_count(&self, domain: DomainTag) -> u64 {
        self.learned_patterns
            .get(DOMAIN_COUNTS_KEY)
            .and_then(|counts| counts.get(domain.as_str()))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Merges a delta. Summaries beyond `max_summaries` drop oldest first.
    pub fn apply(&mut self, delta: &ProfileDelta, max_summaries: usize) {
        self.preferences
            .extend(delta.preferences.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.learned_patterns
            .extend(delta.learned_patterns.iter().map(|(k, v)| (k.clone(), v.clone())));

        if let Some(domain) = delta.domain_used {
            let next = self.domain_count(domain) + 1;
            let counts = self
                .learned_patterns
                .entry(DOMAIN_COUNTS_KEY.to_string())
                .or_insert_with(|| Value::Object(Default::default()));
            if !counts.is_object() {
                *counts = Value::Object(Default::default());
            }
            if let Value::Object(map) = counts {
                map.insert(domain.as_str().to_string(), Value::from(next));
            }
        }

        self.summarized_history.extend(delta.summaries.iter().cloned());
        let overflow = self.summarized_history.len().saturating_sub(max_summaries);
        self.summarized_history.drain(..overflow);
    }
}
