//! Short-term conversational memory.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

use crate::domain::foundation::{SessionId, Timestamp, UserId};
use crate::domain::routing::DomainTag;

/// One completed exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub prompt: String,
    pub response: String,
    /// Domain the request was routed to; `None` for cache-served turns
    /// persisted before routing ran.
    #[serde(default)]
    pub domain: Option<DomainTag>,
    pub timestamp: Timestamp,
}

impl Turn {
    pub fn new(prompt: impl Into<String>, response: impl Into<String>, domain: Option<DomainTag>) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
            domain,
            timestamp: Timestamp::now(),
        }
    }
}

/// Session - bounded short-term history for one `(user, session)` pair.
///
/// # Invariants
///
/// - `history` never holds more than the bound passed to `record_turn`
/// - `last_active_at >= created_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    session_id: SessionId,
    user_id: UserId,
    created_at: Timestamp,
    last_active_at: Timestamp,
    history: VecDeque<Turn>,
}

impl Session {
    /// Starts an empty session.
    pub fn new(user_id: UserId, session_id: SessionId) -> Self {
        let now = Timestamp::now();
        Self {
            session_id,
            user_id,
            created_at: now,
            last_active_at: now,
            history: VecDeque::new(),
        }
    }

    /// Reconstitute a session from persistence.
    pub fn reconstitute(
        user_id: UserId,
        session_id: SessionId,
        created_at: Timestamp,
        last_active_at: Timestamp,
        history: Vec<Turn>,
    ) -> Self {
        Self {
            session_id,
            user_id,
            created_at,
            last_active_at,
            history: history.into(),
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn last_active_at(&self) -> Timestamp {
        self.last_active_at
    }

    /// History, oldest first.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &Turn> + ExactSizeIterator {
        self.history.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    // ───────────────────────────────────────────────────────────────
    // Behavior
    // ───────────────────────────────────────────────────────────────

    /// True when the session has been idle for longer than `ttl`.
    pub fn is_expired(&self, ttl: Duration, now: &Timestamp) -> bool {
        self.last_active_at.is_older_than(ttl, now)
    }

    /// Appends a turn, dropping the oldest entries beyond `max_history`.
    pub fn record_turn(&mut self, turn: Turn, max_history: usize) {
        if turn.timestamp > self.last_active_at {
            self.last_active_at = turn.timestamp;
        }
        self.history.push_back(turn);
        while self.history.len() > max_history {
            self.history.pop_front();
        }
    }

    /// Domain appearing most often among the last `window` turns.
    ///
    /// Ties go to the most recently used domain. `General` turns carry no
    /// preference and are skipped.
    pub fn dominant_domain(&self, window: usize) -> Option<DomainTag> {
        let recent: Vec<DomainTag> = self
            .history
            .iter()
            .rev()
            .take(window)
            .filter_map(|t| t.domain)
            .filter(|d| !d.is_general())
            .collect();

        let mut best: Option<(DomainTag, usize)> = None;
        for domain in &recent {
            let count = recent.iter().filter(|d| *d == domain).count();
            match best {
                Some((_, best_count)) if best_count >= count => {}
                _ => best = Some((*domain, count)),
            }
        }
        best.map(|(domain, _)| domain)
    }
}
