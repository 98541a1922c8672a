//! Folder tree repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for the per-user folder forest.
//! - Keep SQL details and ordering behavior inside repository boundary.
//!
//! # Invariants
//! - Folder listing is deterministic: `id ASC`.
//! - Create and reparent re-check parent existence and ownership inside the
//!   write transaction; reparent also re-walks ancestry so concurrent moves
//!   cannot produce a cycle.
//! - Deleting a folder detaches its direct tasks and child folders in the same
//!   transaction as the row delete; nothing below the folder is destroyed.

use super::{ensure_connection_ready, folder_owner, user_exists, RepoError, RepoResult};
use crate::model::folder::{Folder, FolderId};
use crate::model::user::UserId;
use crate::model::EntityKind;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};

const FOLDER_SELECT_SQL: &str = "SELECT
    id,
    name,
    parent_id,
    user_id,
    created_at,
    updated_at
FROM folders";

/// Repository interface for folder tree operations.
pub trait FolderRepository {
    /// Creates one folder under optional parent.
    fn create_folder(
        &self,
        name: &str,
        parent_id: Option<FolderId>,
        user_id: UserId,
    ) -> RepoResult<Folder>;
    /// Loads one folder by id.
    fn get_folder(&self, id: FolderId) -> RepoResult<Option<Folder>>;
    /// Lists all folders owned by one user.
    fn list_folders(&self, user_id: UserId) -> RepoResult<Vec<Folder>>;
    /// Applies a rename and/or reparent. `parent_id: Some(None)` moves to root.
    fn update_folder(
        &self,
        id: FolderId,
        name: Option<&str>,
        parent_id: Option<Option<FolderId>>,
    ) -> RepoResult<Folder>;
    /// Deletes one folder, detaching direct tasks and child folders.
    ///
    /// Returns `false` when the folder does not exist.
    fn delete_folder_reparent(&self, id: FolderId) -> RepoResult<bool>;
    /// Returns whether the user row exists.
    fn user_exists(&self, user_id: UserId) -> RepoResult<bool>;
}

/// SQLite-backed folder repository.
pub struct SqliteFolderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFolderRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl FolderRepository for SqliteFolderRepository<'_> {
    fn create_folder(
        &self,
        name: &str,
        parent_id: Option<FolderId>,
        user_id: UserId,
    ) -> RepoResult<Folder> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if let Some(parent_id) = parent_id {
            ensure_parent_owned_by(&tx, parent_id, user_id)?;
        }

        tx.execute(
            "INSERT INTO folders (name, parent_id, user_id) VALUES (?1, ?2, ?3);",
            params![name, parent_id, user_id],
        )?;
        let folder = load_required_folder(&tx, tx.last_insert_rowid())?;
        tx.commit()?;
        Ok(folder)
    }

    fn get_folder(&self, id: FolderId) -> RepoResult<Option<Folder>> {
        let folder = self
            .conn
            .query_row(
                &format!("{FOLDER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_folder_row,
            )
            .optional()?;
        Ok(folder)
    }

    fn list_folders(&self, user_id: UserId) -> RepoResult<Vec<Folder>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FOLDER_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([user_id])?;
        let mut folders = Vec::new();
        while let Some(row) = rows.next()? {
            folders.push(parse_folder_row(row)?);
        }
        Ok(folders)
    }

    fn update_folder(
        &self,
        id: FolderId,
        name: Option<&str>,
        parent_id: Option<Option<FolderId>>,
    ) -> RepoResult<Folder> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let owner = folder_owner(&tx, id)?.ok_or(RepoError::NotFound(EntityKind::Folder, id))?;

        if let Some(Some(new_parent)) = parent_id {
            ensure_parent_acceptable(&tx, id, owner, new_parent)?;
        }

        let mut assignments = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(name) = name {
            assignments.push("name = ?");
            bind_values.push(Value::Text(name.to_string()));
        }
        if let Some(parent_id) = parent_id {
            assignments.push("parent_id = ?");
            bind_values.push(parent_id.map_or(Value::Null, Value::Integer));
        }

        if !assignments.is_empty() {
            assignments.push("updated_at = (strftime('%s', 'now') * 1000)");
            bind_values.push(Value::Integer(id));
            tx.execute(
                &format!(
                    "UPDATE folders SET {} WHERE id = ?;",
                    assignments.join(", ")
                ),
                params_from_iter(bind_values),
            )?;
        }

        let folder = load_required_folder(&tx, id)?;
        tx.commit()?;
        Ok(folder)
    }

    fn delete_folder_reparent(&self, id: FolderId) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if folder_owner(&tx, id)?.is_none() {
            return Ok(false);
        }

        let detached_tasks = tx.execute(
            "UPDATE tasks
             SET folder_id = NULL,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE folder_id = ?1;",
            [id],
        )?;
        let detached_folders = tx.execute(
            "UPDATE folders
             SET parent_id = NULL,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE parent_id = ?1;",
            [id],
        )?;
        tx.execute("DELETE FROM folders WHERE id = ?1;", [id])?;
        tx.commit()?;

        debug!(
            "event=folder_delete module=repo status=ok folder_id={} detached_tasks={} detached_folders={}",
            id, detached_tasks, detached_folders
        );
        Ok(true)
    }

    fn user_exists(&self, user_id: UserId) -> RepoResult<bool> {
        user_exists(self.conn, user_id)
    }
}

fn ensure_parent_acceptable(
    conn: &Connection,
    folder_id: FolderId,
    owner: UserId,
    parent_id: FolderId,
) -> RepoResult<()> {
    ensure_parent_owned_by(conn, parent_id, owner)?;
    if is_self_or_ancestor(conn, folder_id, parent_id)? {
        return Err(RepoError::Cycle {
            folder_id,
            parent_id,
        });
    }
    Ok(())
}

fn ensure_parent_owned_by(
    conn: &Connection,
    parent_id: FolderId,
    owner: UserId,
) -> RepoResult<()> {
    let parent_owner = folder_owner(conn, parent_id)?
        .ok_or(RepoError::NotFound(EntityKind::Folder, parent_id))?;
    if parent_owner != owner {
        return Err(RepoError::ForeignOwner(EntityKind::Folder, parent_id));
    }
    Ok(())
}

/// Returns whether `folder_id` appears on the ancestor chain starting at
/// `start` (inclusive).
fn is_self_or_ancestor(
    conn: &Connection,
    folder_id: FolderId,
    start: FolderId,
) -> RepoResult<bool> {
    // UNION (not UNION ALL) stops the walk if stored data already loops.
    let found: i64 = conn.query_row(
        "WITH RECURSIVE chain(id) AS (
            SELECT ?2
            UNION
            SELECT f.parent_id
            FROM folders f
            INNER JOIN chain c ON f.id = c.id
            WHERE f.parent_id IS NOT NULL
        )
        SELECT EXISTS(SELECT 1 FROM chain WHERE id = ?1);",
        params![folder_id, start],
        |row| row.get(0),
    )?;
    Ok(found == 1)
}

fn load_required_folder(conn: &Connection, id: FolderId) -> RepoResult<Folder> {
    conn.query_row(
        &format!("{FOLDER_SELECT_SQL} WHERE id = ?1;"),
        [id],
        parse_folder_row,
    )
    .optional()?
    .ok_or(RepoError::NotFound(EntityKind::Folder, id))
}

fn parse_folder_row(row: &Row<'_>) -> rusqlite::Result<Folder> {
    Ok(Folder {
        id: row.get("id")?,
        name: row.get("name")?,
        parent_id: row.get("parent_id")?,
        user_id: row.get("user_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
