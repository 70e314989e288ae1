//! Code Toolkit Port - lint and test generated code.
//!
//! Out of process sandboxes are deliberately not modelled; adapters decide
//! how much checking they can do.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LintReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub passed: u32,
    pub failed: u32,
    pub failures: Vec<String>,
}

impl TestReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

#[async_trait]
pub trait CodeToolkit: Send + Sync {
    async fn lint(&self, code: &str, language: &str) -> Result<LintReport, ToolkitError>;

    async fn run_tests(&self, code: &str, language: &str) -> Result<TestReport, ToolkitError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolkitError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("tool failed: {0}")]
    Failed(String),
}
