//! Rate limiter adapters.
//!
//! ## Available Adapters
//!
//! - `InMemoryRateLimiter` - sliding window kept in process memory
//!
//! ## Usage
//!
//! ```ignore
//! use switchboard::adapters::rate_limiter::InMemoryRateLimiter;
//!
//! let limiter = InMemoryRateLimiter::from_config(&config.gate);
//! ```

mod in_memory;

pub use in_memory::InMemoryRateLimiter;
