//! Similarity index adapters.

mod in_memory_index;

pub use in_memory_index::InMemorySimilarityIndex;
