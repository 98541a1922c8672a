//! Folder model.
//!
//! # Invariants
//! - A folder's parent, when set, exists and has the same `user_id`.
//! - The folders of one user form a forest: no folder is its own ancestor.
//! - Tasks belong to one folder directly; ancestors do not contain them.

use super::user::UserId;
use super::{normalize_required, EpochMs, ValidationError};
use serde::{Deserialize, Serialize};

/// Stable folder identifier.
pub type FolderId = i64;

/// Persisted folder record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    /// `None` means root-level folder.
    pub parent_id: Option<FolderId>,
    pub user_id: UserId,
    pub created_at: EpochMs,
    pub updated_at: EpochMs,
}

/// Folder creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFolder {
    pub name: String,
    pub parent_id: Option<FolderId>,
    pub user_id: UserId,
}

/// Folder patch. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderPatch {
    pub name: Option<String>,
    /// `Some(None)` moves the folder to root.
    pub parent_id: Option<Option<FolderId>>,
}

impl FolderPatch {
    /// Returns the trimmed name when one is provided.
    pub fn normalized_name(&self) -> Result<Option<String>, ValidationError> {
        self.name
            .as_deref()
            .map(|name| normalize_required(name, "name"))
            .transpose()
    }

    /// Returns whether the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_id.is_none()
    }
}
