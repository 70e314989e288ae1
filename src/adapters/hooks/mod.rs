//! Built-in hooks.
//!
//! - `CacheCheckHook` (PreProcess) answers from the response cache
//! - `CacheStoreHook` (PostProcess) saves fully successful answers

mod cache_check;
mod cache_store;

pub use cache_check::CacheCheckHook;
pub use cache_store::CacheStoreHook;
