//! Static code checks without a toolchain.
//!
//! `lint` reports unbalanced or mismatched delimiters as errors and overlong
//! lines as warnings. String and character literals and line comments are
//! skipped. `run_tests` executes nothing and reports an empty, passing run.

use async_trait::async_trait;

use crate::ports::{CodeToolkit, LintReport, TestReport, ToolkitError};

const MAX_LINE_LENGTH: usize = 120;

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCodeToolkit;

impl StaticCodeToolkit {
    pub fn new() -> Self {
        Self
    }

    fn comment_prefix(language: &str) -> &'static str {
        match language {
            "python" | "ruby" | "bash" | "shell" | "r" => "#",
            "sql" | "haskell" | "lua" => "--",
            _ => "//",
        }
    }

    fn check_delimiters(code: &str, language: &str, report: &mut LintReport) {
        let comment = Self::comment_prefix(language);
        let mut stack: Vec<(char, usize)> = Vec::new();

        for (line_no, line) in code.lines().enumerate().map(|(i, l)| (i + 1, l)) {
            let mut quote: Option<char> = None;
            let mut escaped = false;

            for (offset, c) in line.char_indices() {
                if let Some(q) = quote {
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == q {
                        quote = None;
                    }
                    continue;
                }
                if line[offset..].starts_with(comment) {
                    break;
                }
                match c {
                    '"' | '`' => quote = Some(c),
                    // Apostrophes are lifetimes in Rust; only treat them as
                    // quotes elsewhere.
                    '\'' if language != "rust" => quote = Some(c),
                    '(' | '[' | '{' => stack.push((c, line_no)),
                    ')' | ']' | '}' => {
                        let expected = match c {
                            ')' => '(',
                            ']' => '[',
                            _ => '{',
                        };
                        match stack.pop() {
                            Some((open, _)) if open == expected => {}
                            Some((open, opened_at)) => report.errors.push(format!(
                                "line {}: '{}' closes '{}' opened on line {}",
                                line_no, c, open, opened_at
                            )),
                            None => report
                                .errors
                                .push(format!("line {}: unmatched '{}'", line_no, c)),
                        }
                    }
                    _ => {}
                }
            }
        }

        for (open, line_no) in stack {
            report
                .errors
                .push(format!("line {}: '{}' is never closed", line_no, open));
        }
    }
}

#[async_trait]
impl CodeToolkit for StaticCodeToolkit {
    async fn lint(&self, code: &str, language: &str) -> Result<LintReport, ToolkitError> {
        let language = language.to_ascii_lowercase();
        let mut report = LintReport::default();

        Self::check_delimiters(code, &language, &mut report);

        for (i, line) in code.lines().enumerate() {
            if line.chars().count() > MAX_LINE_LENGTH {
                report
                    .warnings
                    .push(format!("line {}: longer than {} characters", i + 1, MAX_LINE_LENGTH));
            }
        }

        Ok(report)
    }

    async fn run_tests(&self, _code: &str, _language: &str) -> Result<TestReport, ToolkitError> {
        Ok(TestReport::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn balanced_code_is_clean() {
        let code = "def add(a, b):\n    return (a + b)  # sum (\n";
        let report = StaticCodeToolkit.lint(code, "python").await.unwrap();
        assert!(report.is_clean(), "{:?}", report.errors);
    }

    #[tokio::test]
    async fn reports_unclosed_delimiter() {
        let report = StaticCodeToolkit
            .lint("fn main() {\n    println!(\"hi\");\n", "rust")
            .await
            .unwrap();
        assert_eq!(report.errors, vec!["line 1: '{' is never closed".to_string()]);
    }

    #[tokio::test]
    async fn reports_mismatched_delimiter() {
        let report = StaticCodeToolkit.lint("let x = [1, 2);", "javascript").await.unwrap();
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("')' closes '['"));
    }

    #[tokio::test]
    async fn delimiters_inside_strings_are_ignored() {
        let report = StaticCodeToolkit
            .lint("print(\"(unbalanced\")", "python")
            .await
            .unwrap();
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn rust_lifetimes_are_not_quotes() {
        let report = StaticCodeToolkit
            .lint("fn first<'a>(s: &'a str) -> &'a str { s }", "rust")
            .await
            .unwrap();
        assert!(report.is_clean(), "{:?}", report.errors);
    }

    #[tokio::test]
    async fn long_lines_are_warnings() {
        let code = format!("x = {}", "1".repeat(130));
        let report = StaticCodeToolkit.lint(&code, "python").await.unwrap();
        assert!(report.is_clean());
        assert_eq!(report.warnings.len(), 1);
    }

    #[tokio::test]
    async fn absent_tests_pass() {
        let report = StaticCodeToolkit.run_tests("x = 1", "python").await.unwrap();
        assert!(report.all_passed());
        assert_eq!(report.passed, 0);
    }
}
