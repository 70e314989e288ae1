//! Project knowledge attached to a request.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::ProjectId;

/// Freeform knowledge about a project (overview, design notes, known issues).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    project_id: ProjectId,
    #[serde(default)]
    fields: BTreeMap<String, String>,
}

/// Fields to upsert into a `ProjectContext`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectDelta {
    pub fields: BTreeMap<String, String>,
}

impl ProjectContext {
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn apply(&mut self, delta: &ProjectDelta) {
        self.fields
            .extend(delta.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}
