//! Core domain logic for the taskboard task tracker.
//!
//! Owns folder hierarchy rules, shared-task and project visibility, and the
//! reminder dispatch ledger. Transport and presentation live elsewhere.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging};
pub use model::folder::{Folder, FolderId, FolderPatch, NewFolder};
pub use model::project::{NewProject, Project, ProjectId, ProjectMember, ProjectRole};
pub use model::reminder::{NewReminder, Reminder, ReminderId, ReminderState};
pub use model::task::{
    FolderFilter, NewTask, Task, TaskCollaborator, TaskId, TaskPatch, TaskStatus,
};
pub use model::user::{NewUser, User, UserId};
pub use model::{now_epoch_ms, EntityKind, EpochMs, ValidationError};
pub use repo::folder_repo::{FolderRepository, SqliteFolderRepository};
pub use repo::project_repo::{ProjectRepository, SqliteProjectRepository};
pub use repo::reminder_repo::{ReminderRepository, SqliteReminderRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::folder_service::FolderService;
pub use service::project_service::ProjectService;
pub use service::reminder_service::{ReminderNotifier, ReminderService, SweepReport};
pub use service::task_service::TaskService;
pub use service::user_service::{CredentialHasher, UserService};
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
