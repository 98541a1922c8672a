//! Project and membership model.
//!
//! # Invariants
//! - `owner_id` and membership rows are independent sources of visibility; an
//!   owner needs no membership row.
//! - One membership row per `(project_id, user_id)` pair.

use super::user::UserId;
use super::{normalize_required, EpochMs, ValidationError};
use serde::{Deserialize, Serialize};

/// Stable project identifier.
pub type ProjectId = i64;

/// Role carried by a membership row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectRole {
    Owner,
    #[default]
    Member,
}

/// Persisted project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: UserId,
    pub created_at: EpochMs,
    pub updated_at: EpochMs,
}

/// Project creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: UserId,
}

impl NewProject {
    pub(crate) fn normalized_name(&self) -> Result<String, ValidationError> {
        normalize_required(&self.name, "name")
    }
}

/// Visibility grant on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub id: i64,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub role: ProjectRole,
    pub created_at: EpochMs,
}
