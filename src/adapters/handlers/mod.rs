//! Domain handlers and their tooling.
//!
//! - `InferenceHandler` - one model call under a domain system prompt
//! - `CodingHandler` - typed coding commands with a lint/test refinement loop
//! - `StaticCodeToolkit` - toolchain-free `CodeToolkit`

mod coding_handler;
mod inference_handler;
mod static_toolkit;

pub use coding_handler::{CodingHandler, DEFAULT_MAX_ATTEMPTS};
pub use inference_handler::InferenceHandler;
pub use static_toolkit::StaticCodeToolkit;
