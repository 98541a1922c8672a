//! Project and membership use-case service.
//!
//! # Invariants
//! - Project owner must exist at creation time.
//! - Membership requires an existing project and user; a second grant for
//!   the same pair fails with `Conflict` instead of being merged.

use crate::model::project::{NewProject, Project, ProjectId, ProjectMember, ProjectRole};
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::repo::project_repo::ProjectRepository;
use crate::service::error::{ServiceError, ServiceResult};
use log::info;

/// Project service facade.
pub struct ProjectService<R: ProjectRepository> {
    repo: R,
}

impl<R: ProjectRepository> ProjectService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one project owned by an existing user.
    pub fn create_project(&self, request: &NewProject) -> ServiceResult<Project> {
        let name = request.normalized_name()?;
        self.ensure_user_exists(request.owner_id)?;

        let project = self.repo.create_project(
            name.as_str(),
            request.description.as_deref(),
            request.owner_id,
        )?;
        info!(
            "event=project_create module=service status=ok project_id={} owner_id={}",
            project.id, project.owner_id
        );
        Ok(project)
    }

    /// Loads one project.
    pub fn get_project(&self, id: ProjectId) -> ServiceResult<Project> {
        self.repo
            .get_project(id)?
            .ok_or(ServiceError::NotFound(EntityKind::Project, id))
    }

    /// Lists projects `user_id` owns or is a member of, ordered by id.
    pub fn get_projects(&self, user_id: UserId) -> ServiceResult<Vec<Project>> {
        Ok(self.repo.list_visible_projects(user_id)?)
    }

    /// Adds one membership row. Pass `ProjectRole::default()` for `member`.
    pub fn add_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role: ProjectRole,
    ) -> ServiceResult<ProjectMember> {
        self.get_project(project_id)?;
        self.ensure_user_exists(user_id)?;

        let member = self.repo.add_member(project_id, user_id, role)?;
        info!(
            "event=project_member_add module=service status=ok project_id={} user_id={}",
            project_id, user_id
        );
        Ok(member)
    }

    /// Lists membership rows of one existing project.
    pub fn list_members(&self, project_id: ProjectId) -> ServiceResult<Vec<ProjectMember>> {
        self.get_project(project_id)?;
        Ok(self.repo.list_members(project_id)?)
    }

    fn ensure_user_exists(&self, user_id: UserId) -> ServiceResult<()> {
        if !self.repo.user_exists(user_id)? {
            return Err(ServiceError::NotFound(EntityKind::User, user_id));
        }
        Ok(())
    }
}
