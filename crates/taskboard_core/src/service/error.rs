//! Error taxonomy shared by all services.

use crate::model::{EntityKind, ValidationError};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Typed failure returned by every service operation.
#[derive(Debug)]
pub enum ServiceError {
    /// Request field failed validation.
    Validation(ValidationError),
    /// Referenced entity does not exist.
    NotFound(EntityKind, i64),
    /// Referenced entity belongs to a different user than the acting owner.
    OwnershipMismatch { entity: EntityKind, id: i64 },
    /// Duplicate membership, collaboration or email.
    Conflict(EntityKind),
    /// Folder move would create a parent-child cycle.
    Cycle { folder_id: i64, parent_id: i64 },
    /// Unknown email or wrong password. Both map here on purpose so callers
    /// cannot probe which emails exist.
    AuthenticationFailed,
    /// Credential hasher failed to produce a hash.
    Credential(String),
    /// Storage-layer failure, surfaced unchanged.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(entity, id) => write!(f, "{entity} not found: {id}"),
            Self::OwnershipMismatch { entity, id } => {
                write!(f, "{entity} {id} belongs to a different user")
            }
            Self::Conflict(entity) => write!(f, "{entity} already exists"),
            Self::Cycle {
                folder_id,
                parent_id,
            } => write!(
                f,
                "moving folder {folder_id} under {parent_id} would create a cycle"
            ),
            Self::AuthenticationFailed => write!(f, "invalid email or password"),
            Self::Credential(message) => write!(f, "credential hashing failed: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(entity, id) => Self::NotFound(entity, id),
            RepoError::Conflict(entity) => Self::Conflict(entity),
            RepoError::ForeignOwner(entity, id) => Self::OwnershipMismatch { entity, id },
            RepoError::Cycle {
                folder_id,
                parent_id,
            } => Self::Cycle {
                folder_id,
                parent_id,
            },
            other => Self::Repo(other),
        }
    }
}

impl ServiceError {
    /// Stable machine-readable code for logs and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(..) => "not_found",
            Self::OwnershipMismatch { .. } => "ownership_mismatch",
            Self::Conflict(_) => "conflict",
            Self::Cycle { .. } => "cycle",
            Self::AuthenticationFailed => "authentication_failed",
            Self::Credential(_) => "credential",
            Self::Repo(_) => "storage",
        }
    }
}
