//! Memory Repository Port - persistence for session, user and project records.
//!
//! Plain key-value semantics keyed by the records' ids. Last write wins; the
//! memory store serializes read-modify-write per session above this layer.

use async_trait::async_trait;

use crate::domain::foundation::{ProjectId, SessionId, UserId};
use crate::domain::memory::{ProjectContext, Session, UserProfile};

#[async_trait]
pub trait MemoryRepository: Send + Sync {
    /// Returns `None` when the session has never been saved.
    async fn load_session(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<Session>, MemoryRepositoryError>;

    async fn save_session(&self, session: &Session) -> Result<(), MemoryRepositoryError>;

    async fn load_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, MemoryRepositoryError>;

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), MemoryRepositoryError>;

    async fn load_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Option<ProjectContext>, MemoryRepositoryError>;

    async fn save_project(&self, project: &ProjectContext) -> Result<(), MemoryRepositoryError>;
}

/// Errors from memory persistence.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MemoryRepositoryError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),
}
