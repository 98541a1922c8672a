//! Task, collaboration and task-visibility use-case service.
//!
//! # Responsibility
//! - Create, patch and delete tasks under folder ownership rules.
//! - Grant collaborator visibility and resolve the visible task set.
//!
//! # Invariants
//! - A task's folder, when set, belongs to the task owner.
//! - A user sees a task once, whether owner, collaborator or both.
//! - Duplicate collaborator grants fail with `Conflict`.

use crate::model::folder::FolderId;
use crate::model::task::{FolderFilter, NewTask, Task, TaskCollaborator, TaskId, TaskPatch};
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::repo::task_repo::TaskRepository;
use crate::service::error::{ServiceError, ServiceResult};
use log::info;

/// Task service facade.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one task for an existing owner.
    pub fn create_task(&self, request: &NewTask) -> ServiceResult<Task> {
        let title = request.normalized_title()?;
        self.ensure_user_exists(request.user_id)?;
        if let Some(folder_id) = request.folder_id {
            self.ensure_folder_owned_by(folder_id, request.user_id)?;
        }

        let task = self.repo.create_task(&NewTask {
            title,
            ..request.clone()
        })?;
        info!(
            "event=task_create module=service status=ok task_id={} user_id={} has_folder={}",
            task.id,
            task.user_id,
            task.folder_id.is_some()
        );
        Ok(task)
    }

    /// Loads one task.
    pub fn get_task(&self, id: TaskId) -> ServiceResult<Task> {
        self.repo
            .get_task(id)?
            .ok_or(ServiceError::NotFound(EntityKind::Task, id))
    }

    /// Lists tasks visible to `user_id`: owned ones plus shared ones.
    ///
    /// Results are deduplicated and ordered by ascending id.
    pub fn get_tasks(&self, user_id: UserId, filter: FolderFilter) -> ServiceResult<Vec<Task>> {
        Ok(self.repo.list_visible_tasks(user_id, filter)?)
    }

    /// Applies a patch to one task.
    pub fn update_task(&self, id: TaskId, patch: &TaskPatch) -> ServiceResult<Task> {
        let title = patch.normalized_title()?;
        let current = self.get_task(id)?;
        if let Some(Some(folder_id)) = patch.folder_id {
            self.ensure_folder_owned_by(folder_id, current.user_id)?;
        }

        let task = self.repo.update_task(
            id,
            &TaskPatch {
                title,
                ..patch.clone()
            },
        )?;
        info!(
            "event=task_update module=service status=ok task_id={} status_changed={} folder_changed={}",
            id,
            patch.status.is_some(),
            patch.folder_id.is_some()
        );
        Ok(task)
    }

    /// Deletes one task together with its collaborators and reminders.
    ///
    /// Returns `false` when the task does not exist.
    pub fn delete_task(&self, id: TaskId) -> ServiceResult<bool> {
        let deleted = self.repo.delete_task_cascade(id)?;
        info!(
            "event=task_delete module=service status=ok task_id={} deleted={}",
            id, deleted
        );
        Ok(deleted)
    }

    /// Grants `user_id` visibility on one task.
    pub fn add_collaborator(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> ServiceResult<TaskCollaborator> {
        self.get_task(task_id)?;
        self.ensure_user_exists(user_id)?;

        let collaborator = self.repo.add_collaborator(task_id, user_id)?;
        info!(
            "event=task_share module=service status=ok task_id={} user_id={}",
            task_id, user_id
        );
        Ok(collaborator)
    }

    /// Lists collaborator grants of one existing task.
    pub fn list_collaborators(&self, task_id: TaskId) -> ServiceResult<Vec<TaskCollaborator>> {
        self.get_task(task_id)?;
        Ok(self.repo.list_collaborators(task_id)?)
    }

    fn ensure_user_exists(&self, user_id: UserId) -> ServiceResult<()> {
        if !self.repo.user_exists(user_id)? {
            return Err(ServiceError::NotFound(EntityKind::User, user_id));
        }
        Ok(())
    }

    fn ensure_folder_owned_by(&self, folder_id: FolderId, user_id: UserId) -> ServiceResult<()> {
        match self.repo.folder_owner(folder_id)? {
            None => Err(ServiceError::NotFound(EntityKind::Folder, folder_id)),
            Some(owner) if owner != user_id => Err(ServiceError::OwnershipMismatch {
                entity: EntityKind::Folder,
                id: folder_id,
            }),
            Some(_) => Ok(()),
        }
    }
}
