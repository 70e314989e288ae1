//! Domain layer containing orchestration types and pure logic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, validation errors)
//! - `memory` - Session, user profile and project records
//! - `routing` - Domain tags, subtasks, keyword rules
//! - `dispatch` - Subtask result envelope
//! - `cache` - vector similarity for the semantic cache
//! - `feedback` - explicit and implicit answer feedback
//! - `trace` - Request-scoped trace and diagnostics
//! - `orchestration` - Request/response types and the error taxonomy

pub mod cache;
pub mod dispatch;
pub mod feedback;
pub mod foundation;
pub mod memory;
pub mod orchestration;
pub mod routing;
pub mod trace;
