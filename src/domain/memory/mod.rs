//! Memory module - session, user and project context records.
//!
//! - `Session` - short-term history with an inactivity TTL
//! - `UserProfile` - long-term preferences and learned patterns
//! - `ProjectContext` - optional project knowledge
//! - `ComposedMemory` - the read-only per-request aggregate

mod composed;
mod profile;
mod project;
mod session;

pub use composed::{ComposedMemory, MemoryDelta};
pub use profile::{ProfileDelta, UserProfile, DOMAIN_COUNTS_KEY};
pub use project::{ProjectContext, ProjectDelta};
pub use session::{Session, Turn};
