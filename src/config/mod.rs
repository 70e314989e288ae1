//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `SWITCHBOARD` prefix and nested values use double underscores as separators.
//! Every value has a default, so an empty environment yields a runnable
//! configuration backed by the mock provider and in-memory storage.
//!
//! # Example
//!
//! ```no_run
//! use switchboard::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod cache;
mod error;
mod feedback;
mod gate;
mod inference;
mod memory;
mod pipeline;
mod server;

pub use cache::CacheConfig;
pub use error::{ConfigError, ValidationError};
pub use feedback::{FeedbackBackend, FeedbackConfig};
pub use gate::GateConfig;
pub use inference::{InferenceBackend, InferenceConfig};
pub use memory::{MemoryBackend, MemoryConfig};
pub use pipeline::{
    AggregationConfig, AggregationMode, DecomposerKind, DetectorKind, DispatchConfig,
    HooksConfig, RoutingConfig, StreamConfig,
};
pub use server::ServerConfig;

use serde::Deserialize;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SWITCHBOARD";

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Inference provider configuration
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Safety denylist and rate limit
    #[serde(default)]
    pub gate: GateConfig,

    /// Session/user/project memory
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Detection and decomposition strategies
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Subtask concurrency and timeouts
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Answer synthesis
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Exact and semantic response cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Hook pipeline
    #[serde(default)]
    pub hooks: HooksConfig,

    /// Streaming responses
    #[serde(default)]
    pub stream: StreamConfig,

    /// Implicit and explicit answer feedback
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SWITCHBOARD` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Splits `GATE__DENYLIST` on commas
    ///
    /// # Environment Variable Format
    ///
    /// - `SWITCHBOARD__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `SWITCHBOARD__GATE__DENYLIST=hack,exploit` -> `gate.denylist = [..]`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("gate.denylist"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.inference.validate()?;
        self.gate.validate()?;
        self.memory.validate()?;
        self.dispatch.validate()?;
        self.cache.validate()?;
        self.stream.validate()?;
        Ok(())
    }
}
