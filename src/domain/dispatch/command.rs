//! Coding handler decisions.

use serde::{Deserialize, Serialize};

/// Language assumed when a coding request names none.
pub const DEFAULT_LANGUAGE: &str = "python";

const LANGUAGES: [(&str, &str); 16] = [
    ("python", "python"),
    ("rust", "rust"),
    ("javascript", "javascript"),
    ("js", "javascript"),
    ("typescript", "typescript"),
    ("ts", "typescript"),
    ("java", "java"),
    ("go", "go"),
    ("golang", "go"),
    ("ruby", "ruby"),
    ("sql", "sql"),
    ("bash", "bash"),
    ("shell", "bash"),
    ("kotlin", "kotlin"),
    ("swift", "swift"),
    ("c", "c"),
];

const EXPLAIN_VERBS: [&str; 7] = ["explain", "describe", "what", "why", "how", "compare", "summarize"];
const REVIEW_VERBS: [&str; 5] = ["review", "check", "debug", "fix", "improve"];

/// What the coding handler will do with a subtask.
///
/// Decided once per subtask and matched exhaustively by the handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CodingCommand {
    /// Write new code, then lint and test it.
    GenerateCode { language: String },
    /// Answer a conceptual question in prose.
    Explain { topic: String },
    /// Critique code supplied in the request.
    ReviewCode { code: String },
}

impl CodingCommand {
    /// Chooses a command from the wording of the task.
    ///
    /// A fenced code block or a review verb ("review", "fix", ...) makes a
    /// review, unless the task opens with an explanation verb. Questions and
    /// explanation verbs make an explanation. Anything else asks for new code.
    pub fn classify(task: &str) -> Self {
        let first_word = task
            .split(|c: char| !c.is_alphanumeric())
            .find(|w| !w.is_empty())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let explains = EXPLAIN_VERBS.contains(&first_word.as_str());
        let reviews = REVIEW_VERBS.contains(&first_word.as_str());

        if let Some(code) = extract_code_block(task) {
            if !explains {
                return CodingCommand::ReviewCode { code };
            }
        }

        if reviews {
            return CodingCommand::ReviewCode {
                code: task.trim().to_string(),
            };
        }

        if explains {
            return CodingCommand::Explain {
                topic: task.trim().to_string(),
            };
        }

        CodingCommand::GenerateCode {
            language: detect_language(task).unwrap_or(DEFAULT_LANGUAGE).to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CodingCommand::GenerateCode { .. } => "generate_code",
            CodingCommand::Explain { .. } => "explain",
            CodingCommand::ReviewCode { .. } => "review_code",
        }
    }
}

/// Programming language named in the text, normalized.
pub fn detect_language(text: &str) -> Option<&'static str> {
    let lowercase = text.to_ascii_lowercase();
    if lowercase.contains("c++") || lowercase.contains("cpp") {
        return Some("cpp");
    }
    if lowercase.contains("c#") {
        return Some("csharp");
    }

    lowercase
        .split(|c: char| !c.is_alphanumeric())
        .find_map(|word| {
            LANGUAGES
                .iter()
                .find(|(alias, _)| *alias == word)
                .map(|(_, language)| *language)
        })
}

/// Body of the first fenced code block, without the fence or info string.
pub fn extract_code_block(text: &str) -> Option<String> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim_end().to_string())
}
