//! Feedback collection configuration

use serde::Deserialize;
use std::path::PathBuf;

/// Feedback collection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackConfig {
    /// Record implicit feedback and accept explicit submissions
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Where records are appended
    #[serde(default)]
    pub backend: FeedbackBackend,

    /// Directory for the daily JSONL files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Where feedback records live
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackBackend {
    #[default]
    Memory,
    File,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            backend: FeedbackBackend::default(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data/feedback")
}
