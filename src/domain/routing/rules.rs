//! Keyword scoring and clause splitting.
//!
//! Pure functions behind the rule-based detection and decomposition
//! strategies. Neither touches an inference provider.

use std::collections::BTreeMap;

use super::DomainTag;

struct KeywordRule {
    domain: DomainTag,
    /// Matched against whole lowercase words.
    words: &'static [&'static str],
    /// Matched as lowercase substrings; worth two points.
    phrases: &'static [&'static str],
}

const RULES: [KeywordRule; 4] = [
    KeywordRule {
        domain: DomainTag::Coding,
        words: &[
            "code", "function", "functions", "program", "bug", "debug", "compile", "compiler",
            "python", "rust", "javascript", "typescript", "java", "golang", "sql", "algorithm",
            "class", "method", "api", "script", "implement", "refactor", "regex", "recursion",
            "array", "loop", "variable", "snippet", "stacktrace", "exception",
        ],
        phrases: &[
            "time complexity",
            "space complexity",
            "unit test",
            "big o",
            "pull request",
            "syntax error",
        ],
    },
    KeywordRule {
        domain: DomainTag::Mathematics,
        words: &[
            "calculate", "equation", "integral", "derivative", "solve", "algebra", "geometry",
            "probability", "matrix", "prime", "factorial", "logarithm", "sqrt", "theorem",
            "proof", "percent", "percentage", "sum", "multiply", "divide", "fraction",
        ],
        phrases: &["square root", "how much is", "what is the value of"],
    },
    KeywordRule {
        domain: DomainTag::Vocabulary,
        words: &[
            "define", "definition", "meaning", "synonym", "synonyms", "antonym", "antonyms",
            "etymology", "pronounce", "pronunciation", "word", "vocabulary",
        ],
        phrases: &["what does", "another word for", "mean?"],
    },
    KeywordRule {
        domain: DomainTag::Grammar,
        words: &[
            "grammar", "grammatical", "grammatically", "punctuation", "proofread", "spelling",
            "tense", "comma", "sentence", "conjugate", "conjugation",
        ],
        phrases: &["is it correct to say", "correct this", "fix the grammar"],
    },
];

/// Verbs that start a new request when they follow a conjunction.
const ACTION_VERBS: [&str; 34] = [
    "explain", "write", "calculate", "compute", "define", "describe", "show", "give", "list",
    "solve", "check", "correct", "translate", "implement", "create", "find", "tell", "compare",
    "summarize", "summarise", "analyze", "analyse", "test", "review", "fix", "convert", "make",
    "generate", "prove", "derive", "suggest", "proofread", "rewrite", "spell",
];

const CONJUNCTIONS: [&str; 4] = [", and then ", " and then ", ", and ", " and "];

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// True when the text contains something like `12 * 4` or `3^2`.
fn has_arithmetic(text: &str) -> bool {
    let compact: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.windows(3).any(|w| {
        w[0].is_ascii_digit() && matches!(w[1], '+' | '-' | '*' | '/' | '^' | '=' | '%') && w[2].is_ascii_digit()
    })
}

/// Scores each domain by keyword hits.
///
/// Returns only domains with a non-zero score, highest first. Ties keep
/// `DomainTag` order.
pub fn score_domains(text: &str) -> Vec<(DomainTag, u32)> {
    let lowercase = text.to_lowercase();
    let tokens = words(text);
    let mut scores: BTreeMap<DomainTag, u32> = BTreeMap::new();

    for rule in &RULES {
        let word_hits = tokens
            .iter()
            .filter(|t| rule.words.contains(&t.as_str()))
            .count() as u32;
        let phrase_hits = rule
            .phrases
            .iter()
            .filter(|p| lowercase.contains(*p))
            .count() as u32;
        let score = word_hits + 2 * phrase_hits;
        if score > 0 {
            scores.insert(rule.domain, score);
        }
    }

    if has_arithmetic(text) {
        *scores.entry(DomainTag::Mathematics).or_insert(0) += 2;
    }

    let mut ranked: Vec<(DomainTag, u32)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
}

fn starts_with_action_verb(text: &str) -> bool {
    words(text)
        .first()
        .map(|first| ACTION_VERBS.contains(&first.as_str()))
        .unwrap_or(false)
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let boundary = matches!(c, '.' | '?' | '!' | ';' | '\n')
            && chars.peek().map_or(true, |next| next.is_whitespace());
        if boundary {
            sentences.push(std::mem::take(&mut current));
        }
    }
    sentences.push(current);

    sentences
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn split_on_conjunctions(sentence: &str) -> Vec<String> {
    let lowercase = sentence.to_ascii_lowercase();
    for conjunction in CONJUNCTIONS {
        let mut search_from = 0;
        while let Some(found) = lowercase[search_from..].find(conjunction) {
            let at = search_from + found;
            let rest = &sentence[at + conjunction.len()..];
            if starts_with_action_verb(rest) {
                let mut parts = vec![sentence[..at].trim().to_string()];
                parts.extend(split_on_conjunctions(rest.trim()));
                return parts;
            }
            search_from = at + conjunction.len();
        }
    }
    vec![sentence.trim().to_string()]
}

/// Splits a prompt into independent requests.
///
/// Sentences are split first, then clauses joined by "and" when the right
/// side opens with an action verb ("... two numbers and explain ...").
/// Always returns at least one element; an atomic prompt comes back whole.
pub fn split_clauses(prompt: &str) -> Vec<String> {
    let parts: Vec<String> = split_sentences(prompt)
        .iter()
        .flat_map(|s| split_on_conjunctions(s))
        .map(|s| s.trim_end_matches([',', ';']).trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        vec![prompt.trim().to_string()]
    } else {
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn scores_coding_prompt() {
        let ranked = score_domains("Write a function to add two numbers and explain its time complexity");
        assert_eq!(ranked.first().map(|r| r.0), Some(DomainTag::Coding));
    }

    #[test]
    fn scores_arithmetic_as_mathematics() {
        let ranked = score_domains("what is 12 * 7?");
        assert_eq!(ranked.first().map(|r| r.0), Some(DomainTag::Mathematics));
    }

    #[test]
    fn scores_vocabulary_and_grammar() {
        assert_eq!(
            score_domains("Give me a synonym for happy")[0].0,
            DomainTag::Vocabulary
        );
        assert_eq!(
            score_domains("Please proofread this sentence for punctuation")[0].0,
            DomainTag::Grammar
        );
    }

    #[test]
    fn unmatched_prompt_has_no_scores() {
        assert!(score_domains("hello there").is_empty());
    }

    #[test]
    fn keywords_match_whole_words_only() {
        // "classic" must not count as "class"
        assert!(score_domains("a classic novel").is_empty());
    }

    #[test]
    fn splits_conjunction_before_action_verb() {
        let parts = split_clauses("Write a function to add two numbers and explain its time complexity");
        assert_eq!(
            parts,
            vec![
                "Write a function to add two numbers".to_string(),
                "explain its time complexity".to_string()
            ]
        );
    }

    #[test]
    fn keeps_noun_conjunctions_together() {
        let parts = split_clauses("What is the difference between salt and pepper?");
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn splits_sentences() {
        let parts = split_clauses("Define entropy. Then calculate 2+2.");
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn empty_prompt_yields_single_part() {
        assert_eq!(split_clauses("   "), vec![String::new()]);
    }

    proptest! {
        #[test]
        fn split_never_returns_empty(prompt in ".{0,200}") {
            prop_assert!(!split_clauses(&prompt).is_empty());
        }
    }
}
