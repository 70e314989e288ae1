//! Response cache configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Response cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum cached responses
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Seconds an entry stays valid; 0 disables expiry
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    /// Enable the embedding-based lookup
    #[serde(default = "default_semantic_enabled")]
    pub semantic_enabled: bool,

    /// Minimum cosine similarity for a semantic hit
    #[serde(default = "default_semantic_threshold")]
    pub semantic_threshold: f32,
}

impl CacheConfig {
    /// Entry lifetime, `None` when expiry is disabled
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }

    /// Validate cache configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.capacity == 0 {
            return Err(ValidationError::MustBePositive("cache.capacity"));
        }
        if !(self.semantic_threshold > 0.0 && self.semantic_threshold <= 1.0) {
            return Err(ValidationError::InvalidThreshold(self.semantic_threshold));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ttl_secs: default_ttl(),
            semantic_enabled: default_semantic_enabled(),
            semantic_threshold: default_semantic_threshold(),
        }
    }
}

fn default_capacity() -> usize {
    500
}

fn default_ttl() -> u64 {
    60 * 60
}

fn default_semantic_enabled() -> bool {
    true
}

fn default_semantic_threshold() -> f32 {
    0.9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 500);
        assert_eq!(config.ttl(), Some(Duration::from_secs(3600)));
        assert!((config.semantic_threshold - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_zero_ttl_disables_expiry() {
        let config = CacheConfig {
            ttl_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.ttl(), None);
    }

    #[test]
    fn test_threshold_bounds() {
        for bad in [0.0, -0.5, 1.5] {
            let config = CacheConfig {
                semantic_threshold: bad,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{bad} should be rejected");
        }
    }
}
