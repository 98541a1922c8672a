//! Domain model for users, folders, tasks, projects and reminders.
//!
//! # Responsibility
//! - Define the records exchanged between repositories, services and callers.
//! - Define write-request shapes and their field validation.
//!
//! # Invariants
//! - Every record is identified by a storage-assigned `i64` id.
//! - Timestamps are Unix epoch milliseconds.
//! - Nullable fields in update requests are tri-state: `None` leaves the
//!   stored value alone, `Some(None)` clears it, `Some(Some(v))` replaces it.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod folder;
pub mod project;
pub mod reminder;
pub mod task;
pub mod user;

/// Unix epoch milliseconds.
pub type EpochMs = i64;

/// Returns the current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> EpochMs {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as EpochMs)
        .unwrap_or(0)
}

/// Persisted entity kinds, used to qualify not-found and conflict errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Folder,
    Task,
    TaskCollaborator,
    Project,
    ProjectMember,
    Reminder,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Folder => "folder",
            Self::Task => "task",
            Self::TaskCollaborator => "task collaborator",
            Self::Project => "project",
            Self::ProjectMember => "project member",
            Self::Reminder => "reminder",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation failure for write requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is blank after trim.
    BlankField(&'static str),
    /// Email does not look like `local@domain.tld`.
    InvalidEmail,
    /// Password is shorter than the accepted minimum.
    PasswordTooShort { min_chars: usize },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::InvalidEmail => write!(f, "email address is not valid"),
            Self::PasswordTooShort { min_chars } => {
                write!(f, "password must have at least {min_chars} characters")
            }
        }
    }
}

impl Error for ValidationError {}

/// Trims a required text field, rejecting blank input.
pub(crate) fn normalize_required(
    value: &str,
    field: &'static str,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(trimmed.to_string())
}
