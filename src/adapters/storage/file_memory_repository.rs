//! File-based Memory Repository Adapter
//!
//! Stores memory records as JSON files on disk:
//!
//! ```text
//! {base}/sessions/{user_id}/{session_id}.json
//! {base}/users/{user_id}.json
//! {base}/projects/{project_id}.json
//! ```
//!
//! Ids are validated on construction to contain no path separators, so they
//! are safe to use as file names.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::{ProjectId, SessionId, UserId};
use crate::domain::memory::{ProjectContext, Session, UserProfile};
use crate::ports::{MemoryRepository, MemoryRepositoryError};

/// File-based storage for memory records
#[derive(Debug, Clone)]
pub struct FileMemoryRepository {
    base_path: PathBuf,
}

impl FileMemoryRepository {
    /// Create a new file repository rooted at `base_path`
    ///
    /// # Example
    /// ```ignore
    /// let repo = FileMemoryRepository::new("./data/memory");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn session_path(&self, user_id: &UserId, session_id: &SessionId) -> PathBuf {
        self.base_path
            .join("sessions")
            .join(user_id.as_str())
            .join(format!("{}.json", session_id.as_str()))
    }

    fn profile_path(&self, user_id: &UserId) -> PathBuf {
        self.base_path
            .join("users")
            .join(format!("{}.json", user_id.as_str()))
    }

    fn project_path(&self, project_id: &ProjectId) -> PathBuf {
        self.base_path
            .join("projects")
            .join(format!("{}.json", project_id.as_str()))
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, MemoryRepositoryError> {
        let json = match fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(MemoryRepositoryError::Io(e.to_string())),
        };

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| MemoryRepositoryError::Deserialization(e.to_string()))
    }

    /// Write through a temp file so readers never see a partial record.
    async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), MemoryRepositoryError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| MemoryRepositoryError::Io(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(value)
            .map_err(|e| MemoryRepositoryError::Serialization(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .map_err(|e| MemoryRepositoryError::Io(e.to_string()))?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| MemoryRepositoryError::Io(e.to_string()))
    }
}

#[async_trait]
impl MemoryRepository for FileMemoryRepository {
    async fn load_session(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<Session>, MemoryRepositoryError> {
        Self::read_json(&self.session_path(user_id, session_id)).await
    }

    async fn save_session(&self, session: &Session) -> Result<(), MemoryRepositoryError> {
        let path = self.session_path(session.user_id(), session.session_id());
        Self::write_json(&path, session).await
    }

    async fn load_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, MemoryRepositoryError> {
        Self::read_json(&self.profile_path(user_id)).await
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), MemoryRepositoryError> {
        Self::write_json(&self.profile_path(profile.user_id()), profile).await
    }

    async fn load_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Option<ProjectContext>, MemoryRepositoryError> {
        Self::read_json(&self.project_path(project_id)).await
    }

    async fn save_project(&self, project: &ProjectContext) -> Result<(), MemoryRepositoryError> {
        Self::write_json(&self.project_path(project.project_id()), project).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::memory::{ProfileDelta, Turn};
    use crate::domain::routing::DomainTag;
    use tempfile::TempDir;

    fn setup() -> (FileMemoryRepository, TempDir) {
        let dir = TempDir::new().unwrap();
        (FileMemoryRepository::new(dir.path()), dir)
    }

    #[tokio::test]
    async fn session_round_trips_through_disk() {
        let (repo, dir) = setup();
        let user = UserId::new("alice").unwrap();
        let session_id = SessionId::new("s-1").unwrap();
        let mut session = Session::new(user.clone(), session_id.clone());
        session.record_turn(Turn::new("2+2", "4", Some(DomainTag::Mathematics)), 10);

        repo.save_session(&session).await.unwrap();

        assert!(dir.path().join("sessions/alice/s-1.json").exists());
        let loaded = repo.load_session(&user, &session_id).await.unwrap().unwrap();
        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn missing_records_load_as_none() {
        let (repo, _dir) = setup();
        let user = UserId::new("nobody").unwrap();
        assert!(repo.load_profile(&user).await.unwrap().is_none());
        assert!(repo
            .load_project(&ProjectId::new("none").unwrap())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn profile_overwrites_previous_version() {
        let (repo, _dir) = setup();
        let user = UserId::new("alice").unwrap();
        let mut profile = UserProfile::new(user.clone());
        repo.save_profile(&profile).await.unwrap();

        profile.apply(
            &ProfileDelta {
                domain_used: Some(DomainTag::Coding),
                ..Default::default()
            },
            10,
        );
        repo.save_profile(&profile).await.unwrap();

        let loaded = repo.load_profile(&user).await.unwrap().unwrap();
        assert_eq!(loaded.domain_count(DomainTag::Coding), 1);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_deserialization_error() {
        let (repo, dir) = setup();
        let users = dir.path().join("users");
        std::fs::create_dir_all(&users).unwrap();
        std::fs::write(users.join("alice.json"), "{not json").unwrap();

        let err = repo
            .load_profile(&UserId::new("alice").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryRepositoryError::Deserialization(_)));
    }
}
