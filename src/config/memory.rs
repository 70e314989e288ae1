//! Memory store configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;

/// Memory store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Idle time after which a session resets
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Turns kept in short-term history
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// One-line summaries kept on the user profile
    #[serde(default = "default_max_summaries")]
    pub max_summaries: usize,

    /// Persistence backend
    #[serde(default)]
    pub backend: MemoryBackend,

    /// Directory for the file backend
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Where memory records live
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBackend {
    #[default]
    Memory,
    File,
}

impl MemoryConfig {
    /// Get session TTL as Duration
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Validate memory configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.session_ttl_secs == 0 {
            return Err(ValidationError::MustBePositive("memory.session_ttl_secs"));
        }
        if self.max_history == 0 {
            return Err(ValidationError::MustBePositive("memory.max_history"));
        }
        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl(),
            max_history: default_max_history(),
            max_summaries: default_max_summaries(),
            backend: MemoryBackend::default(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_session_ttl() -> u64 {
    2 * 60 * 60
}

fn default_max_history() -> usize {
    50
}

fn default_max_summaries() -> usize {
    100
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data/memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config_defaults() {
        let config = MemoryConfig::default();
        assert_eq!(config.session_ttl(), Duration::from_secs(7200));
        assert_eq!(config.max_history, 50);
        assert_eq!(config.backend, MemoryBackend::Memory);
    }

    #[test]
    fn test_zero_history_is_invalid() {
        let config = MemoryConfig {
            max_history: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MustBePositive("memory.max_history"))
        );
    }
}
