//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.
//! - Multi-statement writes run inside one `IMMEDIATE` transaction.
//! - List queries are ordered by id so results are reproducible.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::EntityKind;
use rusqlite::{Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod folder_repo;
pub mod project_repo;
pub mod reminder_repo;
pub mod task_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all persistence implementations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error, surfaced unchanged.
    Db(DbError),
    /// Target row does not exist.
    NotFound(EntityKind, i64),
    /// Insert hit a uniqueness constraint.
    Conflict(EntityKind),
    /// Referenced row exists but belongs to another user.
    ForeignOwner(EntityKind, i64),
    /// Reparenting would make a folder its own ancestor.
    Cycle { folder_id: i64, parent_id: i64 },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(entity, id) => write!(f, "{entity} not found: {id}"),
            Self::Conflict(entity) => write!(f, "{entity} already exists"),
            Self::ForeignOwner(entity, id) => {
                write!(f, "{entity} {id} belongs to another user")
            }
            Self::Cycle {
                folder_id,
                parent_id,
            } => write!(
                f,
                "moving folder {folder_id} under {parent_id} would create a cycle"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(..) => None,
            Self::Conflict(_) => None,
            Self::ForeignOwner(..) => None,
            Self::Cycle { .. } => None,
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Maps a failed insert to `Conflict` when a uniqueness constraint fired.
pub(crate) fn conflict_on_unique(err: rusqlite::Error, entity: EntityKind) -> RepoError {
    let err = DbError::Sqlite(err);
    if err.is_unique_violation() {
        RepoError::Conflict(entity)
    } else {
        RepoError::Db(err)
    }
}

/// Rejects connections that were not opened through `db::open_db*`.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

pub(crate) fn user_exists(conn: &Connection, user_id: i64) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Loads the owner of one folder, if the folder exists.
pub(crate) fn folder_owner(conn: &Connection, folder_id: i64) -> RepoResult<Option<i64>> {
    let owner = conn
        .query_row(
            "SELECT user_id FROM folders WHERE id = ?1;",
            [folder_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(owner)
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
