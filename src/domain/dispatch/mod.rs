//! Dispatch module - per-subtask result envelope and coding decisions.

mod command;
mod result;

pub use command::{detect_language, extract_code_block, CodingCommand, DEFAULT_LANGUAGE};
pub use result::{DispatchFailure, DomainResult};
