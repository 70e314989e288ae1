//! Routing module - domain tags, subtasks and rule-based routing logic.

mod domain_tag;
pub mod rules;
mod subtask;

pub use domain_tag::{DomainTag, UnknownDomain};
pub use subtask::Subtask;
