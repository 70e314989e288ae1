//! Switchboard - conversational request orchestration.
//!
//! Routes a natural-language request to specialized domain handlers
//! (coding, mathematics, vocabulary, grammar, general), runs them
//! concurrently and merges their answers, with per-user memory, a layered
//! response cache, safety and rate gating, and a per-request trace.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
