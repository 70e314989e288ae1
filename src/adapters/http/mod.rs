//! HTTP adapters.

pub mod chat;
pub mod feedback;

pub use chat::{chat_router, ChatAppState};
