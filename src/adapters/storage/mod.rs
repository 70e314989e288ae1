//! Storage Adapters
//!
//! Implementations of the MemoryRepository port.
//!
//! ## Available Adapters
//!
//! - **FileMemoryRepository** - JSON files on disk
//! - **InMemoryMemoryRepository** - process memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileMemoryRepository, InMemoryMemoryRepository};
//!
//! let repo = FileMemoryRepository::new("./data/memory");
//! let repo = InMemoryMemoryRepository::new();
//! ```

mod file_memory_repository;
mod in_memory_memory_repository;

pub use file_memory_repository::FileMemoryRepository;
pub use in_memory_memory_repository::InMemoryMemoryRepository;
