//! The read-only memory view handed to routing, dispatch and aggregation.

use std::fmt::Write;

use super::{ProfileDelta, ProjectContext, ProjectDelta, Session, UserProfile};

/// Session, user profile and optional project, assembled for one request.
///
/// There are no mutators: changes go through the memory store and show up
/// in the next composed view.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedMemory {
    session: Session,
    profile: UserProfile,
    project: Option<ProjectContext>,
}

/// Long-term and project changes committed alongside a turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDelta {
    pub profile: Option<ProfileDelta>,
    pub project: Option<ProjectDelta>,
}

impl ComposedMemory {
    pub fn new(session: Session, profile: UserProfile, project: Option<ProjectContext>) -> Self {
        Self {
            session,
            profile,
            project,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn project(&self) -> Option<&ProjectContext> {
        self.project.as_ref()
    }

    /// Plain-text context block for model prompts.
    ///
    /// Includes the last `recent_turns` exchanges, user preferences and
    /// project fields. Empty when there is nothing to say.
    pub fn render_context(&self, recent_turns: usize) -> String {
        let mut out = String::new();

        let skip = self.session.history().len().saturating_sub(recent_turns);
        let turns: Vec<_> = self.session.history().skip(skip).collect();
        if !turns.is_empty() {
            out.push_str("Recent conversation:\n");
            for turn in turns {
                let _ = writeln!(out, "User: {}\nAssistant: {}", turn.prompt, turn.response);
            }
        }

        if !self.profile.preferences().is_empty() {
            out.push_str("User preferences:\n");
            for (key, value) in self.profile.preferences() {
                let _ = writeln!(out, "- {key}: {value}");
            }
        }

        if let Some(project) = &self.project {
            if !project.fields().is_empty() {
                let _ = writeln!(out, "Project {}:", project.project_id());
                for (key, value) in project.fields() {
                    let _ = writeln!(out, "- {key}: {value}");
                }
            }
        }

        out
    }
}
