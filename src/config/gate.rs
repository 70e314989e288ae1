//! Request gate configuration (safety denylist and rate limit)

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Request gate configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Requests admitted per user within one window
    #[serde(default = "default_request_limit")]
    pub request_limit: u32,

    /// Sliding window length in milliseconds
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Case-insensitive terms that mark a prompt unsafe
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
}

impl GateConfig {
    /// Get the window as Duration
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Validate gate configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.request_limit == 0 {
            return Err(ValidationError::MustBePositive("gate.request_limit"));
        }
        if self.window_ms == 0 {
            return Err(ValidationError::MustBePositive("gate.window_ms"));
        }
        Ok(())
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            request_limit: default_request_limit(),
            window_ms: default_window_ms(),
            denylist: default_denylist(),
        }
    }
}

fn default_request_limit() -> u32 {
    100
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_denylist() -> Vec<String> {
    vec!["hack".to_string(), "exploit".to_string(), "illegal".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_config_defaults() {
        let config = GateConfig::default();
        assert_eq!(config.request_limit, 100);
        assert_eq!(config.window(), Duration::from_secs(60));
        assert_eq!(config.denylist.len(), 3);
    }

    #[test]
    fn test_zero_limit_is_invalid() {
        let config = GateConfig {
            request_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
