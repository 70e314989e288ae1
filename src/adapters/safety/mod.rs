//! Content safety adapters.

mod denylist;

pub use denylist::{DenylistClassifier, MASK};
