//! MemoryStore - composes and persists per-request memory.
//!
//! `load` and `commit` for one `(user, session)` pair are serialized by a
//! per-session async lock; profile writes additionally take a per-user
//! lock so concurrent sessions of one user do not lose updates. Locks are
//! dropped from the table once no request holds them.

use dashmap::DashMap;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::MemoryConfig;
use crate::domain::foundation::{ProjectId, SessionId, Timestamp, UserId};
use crate::domain::memory::{
    ComposedMemory, MemoryDelta, ProfileDelta, ProjectContext, ProjectDelta, Session, Turn,
    UserProfile,
};
use crate::domain::trace::RequestScope;
use crate::ports::{ContentClassifier, MemoryRepository, MemoryRepositoryError};

/// Characters of the prompt kept in a profile summary line.
const SUMMARY_CHARS: usize = 120;

/// Table of async locks keyed by string.
#[derive(Debug, Default)]
struct KeyedLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Held lock; removes its table entry on drop when nobody else waits.
struct KeyedGuard<'a> {
    table: &'a KeyedLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    async fn lock(&self, key: String) -> KeyedGuard<'_> {
        let lock = self.locks.entry(key.clone()).or_default().clone();
        let guard = lock.lock_owned().await;
        KeyedGuard {
            table: self,
            key,
            guard: Some(guard),
        }
    }

    fn len(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.table
            .locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Bounds applied to stored memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLimits {
    pub session_ttl: Duration,
    pub max_history: usize,
    pub max_summaries: usize,
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self::from(&MemoryConfig::default())
    }
}

impl From<&MemoryConfig> for MemoryLimits {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            session_ttl: config.session_ttl(),
            max_history: config.max_history,
            max_summaries: config.max_summaries,
        }
    }
}

pub struct MemoryStore {
    repository: Arc<dyn MemoryRepository>,
    limits: MemoryLimits,
    sanitizer: Option<Arc<dyn ContentClassifier>>,
    locks: KeyedLocks,
}

impl MemoryStore {
    pub fn new(repository: Arc<dyn MemoryRepository>, limits: MemoryLimits) -> Self {
        Self {
            repository,
            limits,
            sanitizer: None,
            locks: KeyedLocks::default(),
        }
    }

    /// Masks prompt summaries with the classifier's `sanitize` before storing them.
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn ContentClassifier>) -> Self {
        self.sanitizer = Some(sanitizer);
        self
    }

    pub fn limits(&self) -> MemoryLimits {
        self.limits
    }

    fn session_key(user_id: &UserId, session_id: &SessionId) -> String {
        format!("session:{}:{}", user_id, session_id)
    }

    fn user_key(user_id: &UserId) -> String {
        format!("user:{}", user_id)
    }

    /// Loads the stored session, replacing it with an empty one when absent
    /// or idle past the TTL. The session id is kept across a reset.
    async fn current_session(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<(Session, bool), MemoryRepositoryError> {
        match self.repository.load_session(user_id, session_id).await? {
            Some(session) if session.is_expired(self.limits.session_ttl, &Timestamp::now()) => {
                Ok((Session::new(user_id.clone(), session_id.clone()), true))
            }
            Some(session) => Ok((session, false)),
            None => Ok((Session::new(user_id.clone(), session_id.clone()), false)),
        }
    }

    async fn current_profile(&self, user_id: &UserId) -> Result<UserProfile, MemoryRepositoryError> {
        Ok(self
            .repository
            .load_profile(user_id)
            .await?
            .unwrap_or_else(|| UserProfile::new(user_id.clone())))
    }

    async fn current_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<ProjectContext, MemoryRepositoryError> {
        Ok(self
            .repository
            .load_project(project_id)
            .await?
            .unwrap_or_else(|| ProjectContext::new(project_id.clone())))
    }

    /// Assembles session, profile and optional project context.
    pub async fn load(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        project_id: Option<&ProjectId>,
        scope: &RequestScope,
    ) -> Result<ComposedMemory, MemoryRepositoryError> {
        let _guard = self.locks.lock(Self::session_key(user_id, session_id)).await;

        let (session, expired) = self.current_session(user_id, session_id).await?;
        if expired {
            tracing::debug!(user_id = %user_id, session_id = %session_id, "session expired, starting fresh");
        }
        let profile = self.current_profile(user_id).await?;
        let project = match project_id {
            Some(id) => Some(self.current_project(id).await?),
            None => None,
        };

        scope.record(
            "memory.loaded",
            json!({
                "history_len": session.history().len(),
                "session_expired": expired,
                "project": project_id.map(|p| p.as_str()),
            }),
        );

        Ok(ComposedMemory::new(session, profile, project))
    }

    fn summarize(&self, turn: &Turn) -> String {
        let prompt: String = turn.prompt.split_whitespace().collect::<Vec<_>>().join(" ");
        let prompt = match &self.sanitizer {
            Some(s) => s.sanitize(&prompt),
            None => prompt,
        };
        let clipped: String = prompt.chars().take(SUMMARY_CHARS).collect();
        let ellipsis = if prompt.chars().count() > SUMMARY_CHARS { "..." } else { "" };
        match turn.domain {
            Some(domain) => format!("[{}] {}{}", domain, clipped, ellipsis),
            None => format!("{}{}", clipped, ellipsis),
        }
    }

    /// Appends `turn` to the session and merges long-term and project deltas.
    ///
    /// The session is saved first. Profile and project writes are attempted
    /// independently; the first failure is returned after both have run.
    pub async fn commit(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        turn: Turn,
        project_id: Option<&ProjectId>,
        delta: MemoryDelta,
    ) -> Result<(), MemoryRepositoryError> {
        let _session_guard = self.locks.lock(Self::session_key(user_id, session_id)).await;

        let mut profile_delta = delta.profile.unwrap_or_default();
        profile_delta.summaries.push(self.summarize(&turn));
        if profile_delta.domain_used.is_none() {
            profile_delta.domain_used = turn.domain;
        }

        let (mut session, _) = self.current_session(user_id, session_id).await?;
        session.record_turn(turn, self.limits.max_history);
        self.repository.save_session(&session).await?;

        let profile_result = self.merge_profile(user_id, &profile_delta).await;

        let project_result = match (project_id, delta.project) {
            (Some(id), Some(project_delta)) => self.merge_project(id, &project_delta).await,
            _ => Ok(()),
        };

        profile_result.and(project_result)
    }

    async fn merge_project(
        &self,
        project_id: &ProjectId,
        delta: &ProjectDelta,
    ) -> Result<(), MemoryRepositoryError> {
        let mut project = self.current_project(project_id).await?;
        project.apply(delta);
        self.repository.save_project(&project).await
    }

    async fn merge_profile(
        &self,
        user_id: &UserId,
        delta: &ProfileDelta,
    ) -> Result<(), MemoryRepositoryError> {
        if delta.is_empty() {
            return Ok(());
        }
        let _user_guard = self.locks.lock(Self::user_key(user_id)).await;
        let mut profile = self.current_profile(user_id).await?;
        profile.apply(delta, self.limits.max_summaries);
        self.repository.save_profile(&profile).await
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::safety::DenylistClassifier;
    use crate::adapters::storage::InMemoryMemoryRepository;
    use crate::domain::foundation::RequestId;
    use crate::domain::routing::DomainTag;

    fn ids() -> (UserId, SessionId) {
        (UserId::new("alice").unwrap(), SessionId::new("s-1").unwrap())
    }

    fn store(repo: &InMemoryMemoryRepository) -> MemoryStore {
        MemoryStore::new(Arc::new(repo.clone()), MemoryLimits::default())
    }

    fn scope() -> RequestScope {
        RequestScope::new(RequestId::new())
    }

    #[tokio::test]
    async fn first_load_is_empty_and_not_persisted() {
        let repo = InMemoryMemoryRepository::new();
        let (user, session) = ids();

        let memory = store(&repo).load(&user, &session, None, &scope()).await.unwrap();

        assert!(memory.session().is_empty());
        assert!(memory.project().is_none());
        assert_eq!(repo.session_count().await, 0);
    }

    #[tokio::test]
    async fn commit_then_load_returns_history() {
        let repo = InMemoryMemoryRepository::new();
        let store = store(&repo);
        let (user, session) = ids();

        store
            .commit(&user, &session, Turn::new("hi", "hello", None), None, MemoryDelta::default())
            .await
            .unwrap();

        let memory = store.load(&user, &session, None, &scope()).await.unwrap();
        assert_eq!(memory.session().history().len(), 1);
    }

    #[tokio::test]
    async fn expired_session_loads_with_empty_history() {
        let repo = InMemoryMemoryRepository::new();
        let (user, session_id) = ids();
        let stale = Timestamp::now().minus_secs(3 * 3600);
        let old = Session::reconstitute(
            user.clone(),
            session_id.clone(),
            stale,
            stale,
            vec![Turn::new("old", "answer", None)],
        );
        repo.save_session(&old).await.unwrap();

        let scope = scope();
        let memory = store(&repo).load(&user, &session_id, None, &scope).await.unwrap();

        assert!(memory.session().is_empty());
        assert_eq!(memory.session().session_id(), &session_id);
        assert_eq!(scope.finish().trace[0].detail["session_expired"], true);
    }

    #[tokio::test]
    async fn history_is_truncated_to_limit() {
        let repo = InMemoryMemoryRepository::new();
        let limits = MemoryLimits {
            max_history: 3,
            ..MemoryLimits::default()
        };
        let store = MemoryStore::new(Arc::new(repo.clone()), limits);
        let (user, session) = ids();

        for i in 0..5 {
            store
                .commit(
                    &user,
                    &session,
                    Turn::new(format!("q{}", i), "a", None),
                    None,
                    MemoryDelta::default(),
                )
                .await
                .unwrap();
        }

        let memory = store.load(&user, &session, None, &scope()).await.unwrap();
        let prompts: Vec<_> = memory.session().history().map(|t| t.prompt.clone()).collect();
        assert_eq!(prompts, vec!["q2", "q3", "q4"]);
    }

    #[tokio::test]
    async fn commit_learns_domain_and_sanitized_summary() {
        let repo = InMemoryMemoryRepository::new();
        let classifier = DenylistClassifier::new(["exploit"]).unwrap();
        let store = store(&repo).with_sanitizer(Arc::new(classifier));
        let (user, session) = ids();

        store
            .commit(
                &user,
                &session,
                Turn::new("Explain   the exploit in\nthis code", "...", Some(DomainTag::Coding)),
                None,
                MemoryDelta::default(),
            )
            .await
            .unwrap();

        let profile = repo.load_profile(&user).await.unwrap().unwrap();
        assert_eq!(profile.domain_count(DomainTag::Coding), 1);
        assert_eq!(
            profile.summarized_history(),
            &["[coding] Explain the *** in this code".to_string()]
        );
    }

    #[tokio::test]
    async fn project_delta_is_persisted() {
        let repo = InMemoryMemoryRepository::new();
        let store = store(&repo);
        let (user, session) = ids();
        let project_id = ProjectId::new("p-1").unwrap();
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("language".to_string(), "rust".to_string());

        store
            .commit(
                &user,
                &session,
                Turn::new("q", "a", None),
                Some(&project_id),
                MemoryDelta {
                    profile: None,
                    project: Some(ProjectDelta { fields }),
                },
            )
            .await
            .unwrap();

        let memory = store
            .load(&user, &session, Some(&project_id), &scope())
            .await
            .unwrap();
        assert_eq!(memory.project().unwrap().field("language"), Some("rust"));
    }

    #[tokio::test]
    async fn concurrent_commits_to_one_session_are_not_lost() {
        let repo = InMemoryMemoryRepository::new();
        let store = Arc::new(store(&repo));
        let (user, session) = ids();

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let store = store.clone();
                let (user, session) = (user.clone(), session.clone());
                tokio::spawn(async move {
                    store
                        .commit(
                            &user,
                            &session,
                            Turn::new(format!("q{}", i), "a", Some(DomainTag::Mathematics)),
                            None,
                            MemoryDelta::default(),
                        )
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let memory = store.load(&user, &session, None, &scope()).await.unwrap();
        assert_eq!(memory.session().history().len(), 20);
        assert_eq!(memory.profile().domain_count(DomainTag::Mathematics), 20);
        assert_eq!(store.lock_count(), 0);
    }
}
