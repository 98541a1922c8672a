//! Task and task collaboration model.
//!
//! # Invariants
//! - `folder_id`, when set, points at a folder with the same owner.
//! - A collaborator row grants visibility only, never ownership.
//! - One collaborator row per `(task_id, user_id)` pair.

use super::folder::FolderId;
use super::user::UserId;
use super::{normalize_required, EpochMs, ValidationError};
use serde::{Deserialize, Serialize};

/// Stable task identifier.
pub type TaskId = i64;

/// Kanban lifecycle of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created but not started.
    #[default]
    Todo,
    /// Work is in progress.
    InProgress,
    /// Finished.
    Completed,
}

/// Persisted task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<EpochMs>,
    pub folder_id: Option<FolderId>,
    pub user_id: UserId,
    pub created_at: EpochMs,
    pub updated_at: EpochMs,
}

/// Task creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<EpochMs>,
    pub folder_id: Option<FolderId>,
    pub user_id: UserId,
}

impl NewTask {
    /// Minimal `todo` task with no folder, description or due date.
    pub fn titled(title: impl Into<String>, user_id: UserId) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
            due_date: None,
            folder_id: None,
            user_id,
        }
    }

    /// Places the task directly inside `folder_id`.
    pub fn in_folder(mut self, folder_id: FolderId) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    pub(crate) fn normalized_title(&self) -> Result<String, ValidationError> {
        normalize_required(&self.title, "title")
    }
}

/// Task patch. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Option<EpochMs>>,
    /// `Some(None)` removes the task from its folder.
    pub folder_id: Option<Option<FolderId>>,
}

impl TaskPatch {
    pub(crate) fn normalized_title(&self) -> Result<Option<String>, ValidationError> {
        self.title
            .as_deref()
            .map(|title| normalize_required(title, "title"))
            .transpose()
    }
}

/// Folder restriction applied when listing visible tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FolderFilter {
    /// No folder restriction.
    #[default]
    Any,
    /// Only tasks that sit in no folder.
    Unfiled,
    /// Only tasks directly inside this folder.
    In(FolderId),
}

impl From<Option<FolderId>> for FolderFilter {
    /// Maps an explicit nullable folder id: `None` means "no folder".
    fn from(value: Option<FolderId>) -> Self {
        match value {
            Some(folder_id) => Self::In(folder_id),
            None => Self::Unfiled,
        }
    }
}

/// Read-visibility grant on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCollaborator {
    pub id: i64,
    pub task_id: TaskId,
    pub user_id: UserId,
    pub created_at: EpochMs,
}
