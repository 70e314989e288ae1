//! CacheLayer - exact and semantic response cache.
//!
//! The exact tier is a `moka` cache with LRU eviction, keyed by the SHA-256
//! of the normalized prompt. The semantic tier maps prompt embeddings to
//! exact keys through a `SimilarityIndex`; a semantic hit still reads the
//! value from the exact tier, so eviction and expiry apply to both tiers.
//!
//! Moka reports evictions and expirations through its listener during
//! housekeeping. Every operation runs pending housekeeping and then drops
//! the reported keys from the similarity index.

use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::domain::orchestration::FinalResponse;
use crate::ports::{InferenceProvider, SimilarityIndex};

/// How long a lookup embedding is kept for the store that follows it.
const QUERY_EMBEDDING_TTL: Duration = Duration::from_secs(300);

/// Cache lookups that could not be answered.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CacheError {
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("similarity index failed: {0}")]
    Index(String),
}

/// Semantic tier wiring.
pub struct SemanticTier {
    pub index: Arc<dyn SimilarityIndex>,
    pub embedder: Arc<dyn InferenceProvider>,
    pub threshold: f32,
}

pub struct CacheLayer {
    entries: Cache<String, FinalResponse>,
    /// Keys moka evicted or expired that the index still holds.
    dropped: Arc<Mutex<Vec<String>>>,
    /// Embeddings computed by lookups, keyed like `entries`.
    query_embeddings: Cache<String, Vec<f32>>,
    semantic: Option<SemanticTier>,
}

/// Lowercases and collapses whitespace.
pub fn normalize_prompt(prompt: &str) -> String {
    prompt
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hex SHA-256 of the normalized prompt.
pub fn cache_key(prompt: &str) -> String {
    let digest = Sha256::digest(normalize_prompt(prompt).as_bytes());
    format!("{:x}", digest)
}

impl CacheLayer {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let dropped = Arc::new(Mutex::new(Vec::new()));
        let listener_sink = dropped.clone();

        let builder = Cache::builder()
            .max_capacity(capacity as u64)
            .eviction_policy(EvictionPolicy::lru())
            .eviction_listener(move |key: Arc<String>, _value, cause: RemovalCause| {
                if cause.was_evicted() {
                    listener_sink.lock().push(key.as_ref().clone());
                }
            });
        let entries = match ttl {
            Some(ttl) => builder.time_to_live(ttl).build(),
            None => builder.build(),
        };

        Self {
            entries,
            dropped,
            query_embeddings: Cache::builder()
                .max_capacity(capacity as u64)
                .time_to_live(QUERY_EMBEDDING_TTL)
                .build(),
            semantic: None,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.ttl())
    }

    pub fn with_semantic(mut self, tier: SemanticTier) -> Self {
        self.semantic = Some(tier);
        self
    }

    pub fn semantic_enabled(&self) -> bool {
        self.semantic.is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up `key`, refreshing its recency. Expired entries are misses
    /// and leave both tiers.
    pub async fn get_exact(&self, key: &str) -> Option<FinalResponse> {
        let hit = self.entries.get(key);
        self.settle().await;
        hit
    }

    /// Stores `value` under `key`; `embedding` also indexes it for semantic lookup.
    pub async fn set(&self, key: &str, value: FinalResponse, embedding: Option<Vec<f32>>) {
        self.entries.insert(key.to_string(), value);
        self.settle().await;

        let (Some(tier), Some(embedding)) = (&self.semantic, embedding) else {
            return;
        };
        if !self.entries.contains_key(key) {
            return;
        }
        if let Err(e) = tier.index.upsert(key, embedding).await {
            tracing::warn!(error = %e, "failed to index cache entry");
        }
    }

    /// Embedding of `prompt` for storing it. Reuses the one computed by an
    /// earlier semantic lookup of the same prompt.
    pub async fn embedding_for(&self, prompt: &str) -> Result<Option<Vec<f32>>, CacheError> {
        if self.semantic.is_none() {
            return Ok(None);
        }
        if let Some(embedding) = self.query_embeddings.remove(&cache_key(prompt)) {
            return Ok(Some(embedding));
        }
        self.embed(prompt).await
    }

    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>, CacheError> {
        match &self.semantic {
            Some(tier) => tier
                .embedder
                .embed(&normalize_prompt(text))
                .await
                .map(Some)
                .map_err(|e| CacheError::Embedding(e.to_string())),
            None => Ok(None),
        }
    }

    /// Embeds `query` and looks it up semantically. The embedding is kept
    /// for a following [`CacheLayer::embedding_for`] of the same prompt.
    pub async fn get_semantic(&self, query: &str) -> Result<Option<FinalResponse>, CacheError> {
        let Some(embedding) = self.embed(query).await? else {
            return Ok(None);
        };
        let hit = self.get_semantic_with_embedding(&embedding).await?;
        if hit.is_none() {
            self.query_embeddings.insert(cache_key(query), embedding);
        }
        Ok(hit)
    }

    /// Nearest cached entry whose similarity reaches the threshold.
    pub async fn get_semantic_with_embedding(
        &self,
        embedding: &[f32],
    ) -> Result<Option<FinalResponse>, CacheError> {
        let Some(tier) = &self.semantic else {
            return Ok(None);
        };

        let nearest = tier
            .index
            .nearest(embedding)
            .await
            .map_err(|e| CacheError::Index(e.to_string()))?;

        let Some(found) = nearest else {
            return Ok(None);
        };
        if found.score < tier.threshold {
            tracing::debug!(score = found.score, threshold = tier.threshold, "semantic cache miss");
            return Ok(None);
        }

        let hit = self.get_exact(&found.key).await;
        if hit.is_none() {
            self.forget(&[found.key]).await;
        }
        Ok(hit)
    }

    /// Runs moka housekeeping and unindexes whatever it evicted.
    async fn settle(&self) {
        self.entries.run_pending_tasks();
        let dropped = std::mem::take(&mut *self.dropped.lock());
        if !dropped.is_empty() {
            self.forget(&dropped).await;
        }
    }

    /// Removes keys from the similarity index.
    async fn forget(&self, keys: &[String]) {
        let Some(tier) = &self.semantic else {
            return;
        };
        for key in keys {
            if let Err(e) = tier.index.remove(key).await {
                tracing::warn!(key = %key, error = %e, "failed to drop cache entry from index");
            }
        }
    }
}
