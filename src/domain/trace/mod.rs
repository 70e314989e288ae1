//! Trace module - request-scoped explainability.

mod recorder;
mod scope;

pub use recorder::{TraceRecorder, TraceStep};
pub use scope::{RequestScope, ScopeReport};
