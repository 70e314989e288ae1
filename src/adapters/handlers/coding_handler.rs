//! Coding domain handler.
//!
//! Each subtask is first classified into a [`CodingCommand`]. Code
//! generation runs a bounded self-correction loop:
//!
//! ```text
//! generate -> lint -> test -> (clean? done : refine with findings)
//! ```
//!
//! A generation attempt succeeds only with zero lint errors and every test
//! passing. After `max_attempts` failures the subtask fails, carrying the
//! last code and reports in its data payload.

use async_trait::async_trait;
use serde_json::json;
use std::fmt::Write;
use std::sync::Arc;

use crate::domain::dispatch::{extract_code_block, CodingCommand, DispatchFailure, DomainResult};
use crate::domain::routing::Subtask;
use crate::ports::{
    CodeToolkit, DomainHandler, HandlerContext, HandlerError, InferenceProvider, InferenceRequest,
    LintReport, TestReport,
};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const GENERATE_PROMPT: &str = "You are a senior software engineer. Reply with one fenced code \
block containing a complete, working solution, followed by at most three sentences of notes.";
const EXPLAIN_PROMPT: &str = "You are a senior software engineer explaining concepts. Be precise \
and use small examples where they help.";
const REVIEW_PROMPT: &str = "You are a meticulous code reviewer. List concrete problems first, \
most severe first, then suggest a corrected version.";

const CONTEXT_TURNS: usize = 3;

pub struct CodingHandler {
    provider: Arc<dyn InferenceProvider>,
    toolkit: Arc<dyn CodeToolkit>,
    max_attempts: u32,
}

/// Outcome of one generate-lint-test round.
struct Attempt {
    text: String,
    code: String,
    lint: LintReport,
    tests: TestReport,
}

impl Attempt {
    fn passed(&self) -> bool {
        self.lint.is_clean() && self.tests.all_passed()
    }

    fn findings(&self) -> String {
        let mut out = String::new();
        for error in &self.lint.errors {
            let _ = writeln!(out, "- lint: {}", error);
        }
        for failure in &self.tests.failures {
            let _ = writeln!(out, "- test: {}", failure);
        }
        if self.tests.failed > 0 && self.tests.failures.is_empty() {
            let _ = writeln!(out, "- {} test(s) failed", self.tests.failed);
        }
        out
    }
}

impl CodingHandler {
    pub fn new(provider: Arc<dyn InferenceProvider>, toolkit: Arc<dyn CodeToolkit>) -> Self {
        Self {
            provider,
            toolkit,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    fn with_context(task: &str, context: &HandlerContext<'_>) -> String {
        let mut prompt = context.memory.render_context(CONTEXT_TURNS);
        if let Some(summary) = context.multimodal_summary {
            let _ = writeln!(prompt, "Attached media: {}", summary);
        }
        if !prompt.is_empty() {
            prompt.push('\n');
        }
        prompt.push_str(task);
        prompt
    }

    async fn ask(&self, system: &str, prompt: String) -> Result<String, HandlerError> {
        let request = InferenceRequest::new(prompt).with_system_prompt(system);
        Ok(self.provider.infer(request).await?.text)
    }

    async fn attempt(&self, prompt: String, language: &str) -> Result<Attempt, HandlerError> {
        let text = self.ask(GENERATE_PROMPT, prompt).await?;
        let code = extract_code_block(&text).unwrap_or_else(|| text.trim().to_string());

        let lint = self
            .toolkit
            .lint(&code, language)
            .await
            .map_err(|e| HandlerError::Other(e.to_string()))?;
        let tests = self
            .toolkit
            .run_tests(&code, language)
            .await
            .map_err(|e| HandlerError::Other(e.to_string()))?;

        Ok(Attempt {
            text,
            code,
            lint,
            tests,
        })
    }

    async fn generate(
        &self,
        subtask: &Subtask,
        context: &HandlerContext<'_>,
        command: &CodingCommand,
        language: &str,
    ) -> Result<DomainResult, HandlerError> {
        let task = format!("Language: {}\nTask: {}", language, subtask.content());
        let mut prompt = Self::with_context(&task, context);
        let mut attempts = 0;

        loop {
            attempts += 1;
            let attempt = self.attempt(prompt, language).await?;
            let data = json!({
                "command": command,
                "attempts": attempts,
                "code": attempt.code,
                "lint": attempt.lint,
                "tests": attempt.tests,
            });

            if attempt.passed() {
                return Ok(DomainResult::ok(attempt.text).with_data(data));
            }

            tracing::debug!(
                subtask = %subtask.id(),
                attempts,
                lint_errors = attempt.lint.errors.len(),
                failed_tests = attempt.tests.failed,
                "generated code failed checks"
            );

            if attempts >= self.max_attempts {
                return Ok(DomainResult::failed(DispatchFailure::Handler(format!(
                    "generated code failed checks after {} attempts",
                    attempts
                )))
                .with_data(data));
            }

            prompt = format!(
                "{}\n\nYour previous solution:\n```{}\n{}\n```\nFix these problems:\n{}",
                task,
                language,
                attempt.code,
                attempt.findings()
            );
        }
    }

    async fn review(
        &self,
        code: &str,
        context: &HandlerContext<'_>,
        command: &CodingCommand,
    ) -> Result<DomainResult, HandlerError> {
        let language = crate::domain::dispatch::detect_language(code).unwrap_or("text");
        let lint = self
            .toolkit
            .lint(code, language)
            .await
            .map_err(|e| HandlerError::Other(e.to_string()))?;

        let mut task = format!("Review this code:\n```\n{}\n```", code);
        if !lint.errors.is_empty() {
            let _ = write!(task, "\nStatic checks reported:\n- {}", lint.errors.join("\n- "));
        }

        let text = self.ask(REVIEW_PROMPT, Self::with_context(&task, context)).await?;
        Ok(DomainResult::ok(text).with_data(json!({ "command": command, "lint": lint })))
    }
}

#[async_trait]
impl DomainHandler for CodingHandler {
    fn name(&self) -> &str {
        "coding"
    }

    async fn process(
        &self,
        subtask: &Subtask,
        context: HandlerContext<'_>,
    ) -> Result<DomainResult, HandlerError> {
        let command = CodingCommand::classify(subtask.content());
        tracing::debug!(subtask = %subtask.id(), command = command.name(), "coding command");

        match &command {
            CodingCommand::GenerateCode { language } => {
                self.generate(subtask, &context, &command, language).await
            }
            CodingCommand::Explain { topic } => {
                let text = self.ask(EXPLAIN_PROMPT, Self::with_context(topic, &context)).await?;
                Ok(DomainResult::ok(text).with_data(json!({ "command": command })))
            }
            CodingCommand::ReviewCode { code } => self.review(code, &context, &command).await,
        }
    }
}
