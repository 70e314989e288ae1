//! Application layer - the orchestration stages and their wiring.
//!
//! Each stage is a component owning its collaborators through port trait
//! objects. The `Orchestrator` runs them in order for one request, passing
//! a fresh `RequestScope` through every call.
//!
//! - `RequestGate` - safety screening and rate limiting
//! - `MemoryStore` - session/profile/project load and commit
//! - `DomainRouter` - domain detection and decomposition
//! - `DispatchCoordinator` - bounded concurrent handler fan-out
//! - `ResponseAggregator` - merge of subtask results
//! - `CacheLayer` - exact and semantic response cache
//! - `HookPipeline` - pre/post extension points

mod aggregator;
pub mod bootstrap;
mod cache;
mod dispatch;
mod gate;
mod hooks;
mod memory_store;
mod orchestrator;
mod router;
mod streaming;

pub use aggregator::ResponseAggregator;
pub use bootstrap::{build_orchestrator, build_provider, BootstrapError};
pub use cache::{cache_key, normalize_prompt, CacheError, CacheLayer, SemanticTier};
pub use dispatch::{DispatchCoordinator, DispatchLimits, HandlerRegistry};
pub use gate::RequestGate;
pub use hooks::HookPipeline;
pub use memory_store::{MemoryLimits, MemoryStore};
pub use orchestrator::Orchestrator;
pub use router::DomainRouter;
pub use streaming::{chunk_text, ResponseStream, StreamEnd, StreamEvent};
