//! Similarity Index Port - nearest-neighbour search over cached embeddings.

use async_trait::async_trait;

/// Closest stored vector to a query.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatch {
    pub key: String,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
}

#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Inserts or replaces the vector stored under `key`.
    async fn upsert(&self, key: &str, embedding: Vec<f32>) -> Result<(), SimilarityIndexError>;

    /// Best match for `query`, if the index holds anything.
    async fn nearest(&self, query: &[f32]) -> Result<Option<SimilarityMatch>, SimilarityIndexError>;

    async fn remove(&self, key: &str) -> Result<(), SimilarityIndexError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimilarityIndexError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index unavailable: {0}")]
    Unavailable(String),
}
