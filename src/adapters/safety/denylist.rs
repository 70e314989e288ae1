//! Denylist content classifier.
//!
//! Flags prompts containing any configured term as a whole word,
//! case-insensitively. "hack" matches "How do I hack a server" but not
//! "hackathon". Word boundaries only apply at term edges that are word
//! characters, so "c++" and "rm -rf /" match as written.

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

use crate::ports::{ClassifierError, ContentClassifier, SafetyVerdict};

/// Mask written over denylisted terms by `sanitize`.
pub const MASK: &str = "***";

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Escaped term, anchored with `\b` on each word-character edge.
fn term_pattern(term: &str) -> String {
    let leading = term.chars().next().is_some_and(is_word_char);
    let trailing = term.chars().last().is_some_and(is_word_char);
    format!(
        "(?:{}{}{})",
        if leading { r"\b" } else { "" },
        regex::escape(term),
        if trailing { r"\b" } else { "" },
    )
}

/// Whole-word denylist matcher.
#[derive(Debug, Clone)]
pub struct DenylistClassifier {
    pattern: Option<Regex>,
}

impl DenylistClassifier {
    /// Builds the matcher. Blank terms are ignored; an empty list admits everything.
    ///
    /// # Errors
    ///
    /// Returns `regex::Error` if the combined pattern exceeds the regex size limit.
    pub fn new<I, S>(terms: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .map(|t| term_pattern(&t))
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = RegexBuilder::new(&alternatives.join("|"))
            .case_insensitive(true)
            .build()?;

        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// First denylisted term found in `text`, as written in the text.
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern
            .as_ref()
            .and_then(|p| p.find(text))
            .map(|m| m.as_str())
    }

    /// Replaces every denylisted term with `***`.
    pub fn mask(&self, text: &str) -> String {
        match &self.pattern {
            Some(p) => p.replace_all(text, MASK).into_owned(),
            None => text.to_string(),
        }
    }
}

#[async_trait]
impl ContentClassifier for DenylistClassifier {
    async fn classify(&self, prompt: &str) -> Result<SafetyVerdict, ClassifierError> {
        Ok(match self.find(prompt) {
            Some(term) => SafetyVerdict::Unsafe {
                reason: format!("denylisted term '{}'", term.to_lowercase()),
            },
            None => SafetyVerdict::Safe,
        })
    }

    fn sanitize(&self, text: &str) -> String {
        self.mask(text)
    }
}
