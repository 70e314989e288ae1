//! Model-backed task decomposer.
//!
//! The model is asked for a JSON array whose items are either plain strings
//! or `{"task": ..., "domain": ...}` objects. Prose around the array is
//! tolerated.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::memory::ComposedMemory;
use crate::domain::routing::DomainTag;
use crate::ports::{DecomposedPart, InferenceProvider, InferenceRequest, RoutingError, TaskDecomposer};

const SYSTEM_PROMPT: &str = "Split the user's request into independent subtasks. Reply with a \
JSON array. Each item is either a string or an object {\"task\": string, \"domain\": string}. \
Return a single-item array if the request is atomic.";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPart {
    Text(String),
    Tagged {
        task: String,
        #[serde(default)]
        domain: Option<String>,
    },
}

pub struct InferenceDecomposer {
    provider: Arc<dyn InferenceProvider>,
}

impl InferenceDecomposer {
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        Self { provider }
    }

    /// Extracts the outermost `[...]` and parses it.
    pub(crate) fn parse_parts(text: &str) -> Result<Vec<DecomposedPart>, RoutingError> {
        let start = text
            .find('[')
            .ok_or_else(|| RoutingError::Unparseable("no JSON array".to_string()))?;
        let end = text
            .rfind(']')
            .filter(|end| *end > start)
            .ok_or_else(|| RoutingError::Unparseable("unterminated JSON array".to_string()))?;

        let raw: Vec<RawPart> = serde_json::from_str(&text[start..=end])
            .map_err(|e| RoutingError::Unparseable(e.to_string()))?;

        let parts: Vec<DecomposedPart> = raw
            .into_iter()
            .map(|item| match item {
                RawPart::Text(task) => (task, None),
                RawPart::Tagged { task, domain } => (task, domain),
            })
            .filter(|(task, _)| !task.trim().is_empty())
            .map(|(task, domain)| {
                let part = DecomposedPart::new(task.trim());
                match domain {
                    Some(d) => part.with_hint(d),
                    None => part,
                }
            })
            .collect();

        if parts.is_empty() {
            return Err(RoutingError::Unparseable("empty task list".to_string()));
        }
        Ok(parts)
    }
}

#[async_trait]
impl TaskDecomposer for InferenceDecomposer {
    async fn decompose(
        &self,
        prompt: &str,
        domain: DomainTag,
        memory: &ComposedMemory,
    ) -> Result<Vec<DecomposedPart>, RoutingError> {
        let mut text = format!("Primary domain: {}\n", domain);
        let context = memory.render_context(3);
        if !context.is_empty() {
            text.push_str(&context);
        }
        text.push_str("\nRequest: ");
        text.push_str(prompt);

        let request = InferenceRequest::new(text)
            .with_system_prompt(SYSTEM_PROMPT)
            .deterministic();
        let response = self.provider.infer(request).await?;

        Self::parse_parts(&response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_strings() {
        let parts = InferenceDecomposer::parse_parts(r#"["write code", "explain it"]"#).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].content, "explain it");
        assert!(parts[1].domain_hint.is_none());
    }

    #[test]
    fn parses_tagged_objects_inside_prose() {
        let text = r#"Sure! [{"task": "solve 2x=4", "domain": "mathematics"}, "define ephemeral"] Done."#;
        let parts = InferenceDecomposer::parse_parts(text).unwrap();
        assert_eq!(parts[0].domain_hint.as_deref(), Some("mathematics"));
        assert_eq!(parts[1].content, "define ephemeral");
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(
            InferenceDecomposer::parse_parts("no list here"),
            Err(RoutingError::Unparseable(_))
        ));
    }

    #[test]
    fn rejects_empty_list() {
        assert!(InferenceDecomposer::parse_parts(r#"["  "]"#).is_err());
    }
}
