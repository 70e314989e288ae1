//! Routing, dispatch, aggregation, hook and streaming configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Domain detection strategy
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    #[default]
    Keyword,
    Inference,
}

/// Prompt decomposition strategy
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecomposerKind {
    #[default]
    Rules,
    Inference,
}

/// How multi-part answers are merged
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Deterministic concatenation in subtask order
    #[default]
    Template,
    /// Model synthesis at temperature 0
    Inference,
}

/// Routing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub detector: DetectorKind,

    #[serde(default)]
    pub decomposer: DecomposerKind,

    /// Recent turns consulted for the history tie-break
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            detector: DetectorKind::default(),
            decomposer: DecomposerKind::default(),
            history_window: default_history_window(),
        }
    }
}

/// Dispatch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Subtasks running at once within one request
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Per-subtask handler timeout
    #[serde(default = "default_subtask_timeout")]
    pub subtask_timeout_ms: u64,

    /// Deadline for the whole dispatch stage of one request
    #[serde(default = "default_dispatch_deadline")]
    pub request_timeout_ms: u64,
}

impl DispatchConfig {
    pub fn subtask_timeout(&self) -> Duration {
        Duration::from_millis(self.subtask_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_in_flight == 0 {
            return Err(ValidationError::MustBePositive("dispatch.max_in_flight"));
        }
        if self.subtask_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.subtask_timeout_ms > self.request_timeout_ms {
            return Err(ValidationError::SubtaskTimeoutTooLong);
        }
        Ok(())
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            subtask_timeout_ms: default_subtask_timeout(),
            request_timeout_ms: default_dispatch_deadline(),
        }
    }
}

/// Aggregation configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregationConfig {
    #[serde(default)]
    pub mode: AggregationMode,
}

/// Hook pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HooksConfig {
    /// A hook running longer than this is skipped
    #[serde(default = "default_hook_timeout")]
    pub handler_timeout_ms: u64,
}

impl HooksConfig {
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_millis(self.handler_timeout_ms)
    }
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            handler_timeout_ms: default_hook_timeout(),
        }
    }
}

/// Streaming configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Mount the streaming endpoint
    #[serde(default = "default_stream_enabled")]
    pub enabled: bool,

    /// Characters per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Buffered events between producer and consumer
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.chunk_size == 0 {
            return Err(ValidationError::MustBePositive("stream.chunk_size"));
        }
        if self.channel_capacity == 0 {
            return Err(ValidationError::MustBePositive("stream.channel_capacity"));
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            enabled: default_stream_enabled(),
            chunk_size: default_chunk_size(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_history_window() -> usize {
    10
}

fn default_max_in_flight() -> usize {
    4
}

fn default_subtask_timeout() -> u64 {
    20_000
}

fn default_dispatch_deadline() -> u64 {
    45_000
}

fn default_hook_timeout() -> u64 {
    5_000
}

fn default_stream_enabled() -> bool {
    true
}

fn default_chunk_size() -> usize {
    100
}

fn default_channel_capacity() -> usize {
    32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_defaults() {
        assert_eq!(RoutingConfig::default().detector, DetectorKind::Keyword);
        assert_eq!(AggregationConfig::default().mode, AggregationMode::Template);
        assert_eq!(DispatchConfig::default().max_in_flight, 4);
        assert_eq!(StreamConfig::default().chunk_size, 100);
        assert!(DispatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_subtask_timeout_must_fit_request_timeout() {
        let config = DispatchConfig {
            subtask_timeout_ms: 10_000,
            request_timeout_ms: 5_000,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::SubtaskTimeoutTooLong));
    }

    #[test]
    fn test_strategy_deserialization() {
        let config: RoutingConfig =
            serde_json::from_str(r#"{"detector":"inference","decomposer":"inference"}"#).unwrap();
        assert_eq!(config.detector, DetectorKind::Inference);
        assert_eq!(config.decomposer, DecomposerKind::Inference);
        assert_eq!(config.history_window, 10);
    }
}
