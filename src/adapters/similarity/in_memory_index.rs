//! Brute-force cosine index held in memory.
//!
//! Linear scan over every stored vector. Adequate for cache-sized
//! collections (hundreds of entries).

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::cache::cosine_similarity;
use crate::ports::{SimilarityIndex, SimilarityIndexError, SimilarityMatch};

/// In-memory similarity index.
#[derive(Debug, Default)]
pub struct InMemorySimilarityIndex {
    vectors: DashMap<String, Vec<f32>>,
    dimensions: Option<usize>,
}

impl InMemorySimilarityIndex {
    /// Index accepting vectors of any length.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index that rejects vectors whose length differs from `dimensions`.
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            vectors: DashMap::new(),
            dimensions: Some(dimensions),
        }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vectors.contains_key(key)
    }

    fn check_dimensions(&self, actual: usize) -> Result<(), SimilarityIndexError> {
        match self.dimensions {
            Some(expected) if expected != actual => {
                Err(SimilarityIndexError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SimilarityIndex for InMemorySimilarityIndex {
    async fn upsert(&self, key: &str, embedding: Vec<f32>) -> Result<(), SimilarityIndexError> {
        self.check_dimensions(embedding.len())?;
        self.vectors.insert(key.to_string(), embedding);
        Ok(())
    }

    async fn nearest(&self, query: &[f32]) -> Result<Option<SimilarityMatch>, SimilarityIndexError> {
        self.check_dimensions(query.len())?;

        let best = self
            .vectors
            .iter()
            .map(|entry| SimilarityMatch {
                key: entry.key().clone(),
                score: cosine_similarity(query, entry.value()),
            })
            .max_by(|a, b| a.score.total_cmp(&b.score));

        Ok(best)
    }

    async fn remove(&self, key: &str) -> Result<(), SimilarityIndexError> {
        self.vectors.remove(key);
        Ok(())
    }
}
