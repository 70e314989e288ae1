//! Domain tags: the closed set of capability areas a subtask can be routed to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A registered capability area.
///
/// `General` is the sentinel every unrecognized or failed detection
/// downgrades to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainTag {
    Coding,
    Mathematics,
    Vocabulary,
    Grammar,
    General,
}

impl DomainTag {
    /// Every tag, in a stable order.
    pub const ALL: [DomainTag; 5] = [
        DomainTag::Coding,
        DomainTag::Mathematics,
        DomainTag::Vocabulary,
        DomainTag::Grammar,
        DomainTag::General,
    ];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainTag::Coding => "coding",
            DomainTag::Mathematics => "mathematics",
            DomainTag::Vocabulary => "vocabulary",
            DomainTag::Grammar => "grammar",
            DomainTag::General => "general",
        }
    }

    /// Short human description used when prompting a model to classify.
    pub fn description(&self) -> &'static str {
        match self {
            DomainTag::Coding => "programming, debugging, algorithms and code review",
            DomainTag::Mathematics => "arithmetic, algebra, calculus, statistics and proofs",
            DomainTag::Vocabulary => "word meanings, synonyms, antonyms and etymology",
            DomainTag::Grammar => "grammar, punctuation, spelling and sentence correction",
            DomainTag::General => "anything that fits none of the other domains",
        }
    }

    pub fn is_general(&self) -> bool {
        matches!(self, DomainTag::General)
    }
}

impl fmt::Display for DomainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a label names no known domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown domain '{0}'")]
pub struct UnknownDomain(pub String);

impl FromStr for DomainTag {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '`')
            .to_lowercase();
        match normalized.as_str() {
            "coding" | "code" | "programming" => Ok(DomainTag::Coding),
            "mathematics" | "math" | "maths" => Ok(DomainTag::Mathematics),
            "vocabulary" | "vocab" | "words" => Ok(DomainTag::Vocabulary),
            "grammar" => Ok(DomainTag::Grammar),
            "general" => Ok(DomainTag::General),
            _ => Err(UnknownDomain(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_names_and_aliases() {
        assert_eq!("coding".parse::<DomainTag>().unwrap(), DomainTag::Coding);
        assert_eq!(" Math ".parse::<DomainTag>().unwrap(), DomainTag::Mathematics);
        assert_eq!("\"vocabulary\"".parse::<DomainTag>().unwrap(), DomainTag::Vocabulary);
    }

    #[test]
    fn rejects_unknown_labels() {
        let err = "astrology".parse::<DomainTag>().unwrap_err();
        assert_eq!(err, UnknownDomain("astrology".to_string()));
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&DomainTag::Mathematics).unwrap();
        assert_eq!(json, "\"mathematics\"");
    }

    #[test]
    fn display_matches_as_str() {
        for tag in DomainTag::ALL {
            assert_eq!(tag.to_string(), tag.as_str());
        }
    }
}
