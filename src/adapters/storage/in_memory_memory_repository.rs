//! In-Memory Memory Repository Adapter
//!
//! Keeps session, profile and project records in process memory.
//! Useful for testing and single-process development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{ProjectId, SessionId, UserId};
use crate::domain::memory::{ProjectContext, Session, UserProfile};
use crate::ports::{MemoryRepository, MemoryRepositoryError};

/// In-memory storage for memory records
#[derive(Debug, Clone, Default)]
pub struct InMemoryMemoryRepository {
    sessions: Arc<RwLock<HashMap<(UserId, SessionId), Session>>>,
    profiles: Arc<RwLock<HashMap<UserId, UserProfile>>>,
    projects: Arc<RwLock<HashMap<ProjectId, ProjectContext>>>,
}

impl InMemoryMemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a project record (projects are authored outside the engine)
    pub async fn insert_project(&self, project: ProjectContext) {
        self.projects
            .write()
            .await
            .insert(project.project_id().clone(), project);
    }

    /// Number of stored sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Clear all stored data (useful for tests)
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
        self.profiles.write().await.clear();
        self.projects.write().await.clear();
    }
}

#[async_trait]
impl MemoryRepository for InMemoryMemoryRepository {
    async fn load_session(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<Session>, MemoryRepositoryError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&(user_id.clone(), session_id.clone())).cloned())
    }

    async fn save_session(&self, session: &Session) -> Result<(), MemoryRepositoryError> {
        let key = (session.user_id().clone(), session.session_id().clone());
        self.sessions.write().await.insert(key, session.clone());
        Ok(())
    }

    async fn load_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, MemoryRepositoryError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), MemoryRepositoryError> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id().clone(), profile.clone());
        Ok(())
    }

    async fn load_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Option<ProjectContext>, MemoryRepositoryError> {
        Ok(self.projects.read().await.get(project_id).cloned())
    }

    async fn save_project(&self, project: &ProjectContext) -> Result<(), MemoryRepositoryError> {
        self.insert_project(project.clone()).await;
        Ok(())
    }
}
