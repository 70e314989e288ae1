//! In-Memory Feedback Log Adapter

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::feedback::FeedbackRecord;
use crate::ports::{FeedbackError, FeedbackRecorder};

/// Feedback kept in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryFeedbackLog {
    records: Arc<RwLock<Vec<FeedbackRecord>>>,
}

impl InMemoryFeedbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, oldest first
    pub async fn records(&self) -> Vec<FeedbackRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl FeedbackRecorder for InMemoryFeedbackLog {
    async fn record(&self, record: &FeedbackRecord) -> Result<(), FeedbackError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }
}
