//! Folder tree use-case service.
//!
//! # Responsibility
//! - Validate folder hierarchy invariants above repository layer.
//! - Provide folder create, list, update and delete operations.
//!
//! # Invariants
//! - Owner must exist; parent, when provided, must exist and share the owner.
//! - Moves must not create parent-child cycles.
//! - Delete is reparent-on-delete: direct tasks and child folders move to
//!   root, nothing else changes.

use crate::model::folder::{Folder, FolderId, FolderPatch, NewFolder};
use crate::model::normalize_required;
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::repo::folder_repo::FolderRepository;
use crate::service::error::{ServiceError, ServiceResult};
use log::info;

/// Folder tree service facade.
pub struct FolderService<R: FolderRepository> {
    repo: R,
}

impl<R: FolderRepository> FolderService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one folder under optional parent.
    pub fn create_folder(&self, request: &NewFolder) -> ServiceResult<Folder> {
        let name = normalize_required(&request.name, "name")?;
        if !self.repo.user_exists(request.user_id)? {
            return Err(ServiceError::NotFound(EntityKind::User, request.user_id));
        }
        if let Some(parent_id) = request.parent_id {
            self.ensure_parent_owned_by(parent_id, request.user_id)?;
        }

        let folder = self
            .repo
            .create_folder(name.as_str(), request.parent_id, request.user_id)?;
        info!(
            "event=folder_create module=service status=ok folder_id={} user_id={} has_parent={}",
            folder.id,
            folder.user_id,
            folder.parent_id.is_some()
        );
        Ok(folder)
    }

    /// Loads one folder.
    pub fn get_folder(&self, id: FolderId) -> ServiceResult<Folder> {
        self.repo
            .get_folder(id)?
            .ok_or(ServiceError::NotFound(EntityKind::Folder, id))
    }

    /// Lists every folder owned by one user, ordered by id.
    pub fn list_folders(&self, user_id: UserId) -> ServiceResult<Vec<Folder>> {
        Ok(self.repo.list_folders(user_id)?)
    }

    /// Applies a rename and/or reparent.
    ///
    /// A new parent must exist, belong to the folder's owner and must not be
    /// the folder itself or one of its descendants.
    pub fn update_folder(&self, id: FolderId, patch: &FolderPatch) -> ServiceResult<Folder> {
        let name = patch.normalized_name()?;
        let current = self.get_folder(id)?;
        if patch.is_empty() {
            return Ok(current);
        }

        if let Some(Some(parent_id)) = patch.parent_id {
            if parent_id == id {
                return Err(ServiceError::Cycle {
                    folder_id: id,
                    parent_id,
                });
            }
            self.ensure_parent_owned_by(parent_id, current.user_id)?;
        }

        // The repository re-walks the ancestor chain inside its write
        // transaction, which is where cycles are finally rejected.
        let folder = self
            .repo
            .update_folder(id, name.as_deref(), patch.parent_id)?;
        info!(
            "event=folder_update module=service status=ok folder_id={} renamed={} reparented={}",
            id,
            patch.name.is_some(),
            patch.parent_id.is_some()
        );
        Ok(folder)
    }

    /// Deletes one folder, moving its direct tasks and children to root.
    ///
    /// Returns `false` when the folder does not exist.
    pub fn delete_folder(&self, id: FolderId) -> ServiceResult<bool> {
        let deleted = self.repo.delete_folder_reparent(id)?;
        info!(
            "event=folder_delete module=service status=ok folder_id={} deleted={}",
            id, deleted
        );
        Ok(deleted)
    }

    fn ensure_parent_owned_by(&self, parent_id: FolderId, user_id: UserId) -> ServiceResult<()> {
        let parent = self
            .repo
            .get_folder(parent_id)?
            .ok_or(ServiceError::NotFound(EntityKind::Folder, parent_id))?;
        if parent.user_id != user_id {
            return Err(ServiceError::OwnershipMismatch {
                entity: EntityKind::Folder,
                id: parent_id,
            });
        }
        Ok(())
    }
}
