//! Task and collaborator repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist tasks, their patches and their collaborator grants.
//! - Resolve the set of tasks visible to one user in a single query.
//!
//! # Invariants
//! - Visible set is `owned ∪ collaborated`, each task at most once.
//! - Task listing is deterministic: `id ASC`.
//! - Deleting a task removes its collaborator and reminder rows in the same
//!   transaction.
//! - Read paths reject unknown `status` values instead of masking them.

use super::{
    conflict_on_unique, ensure_connection_ready, folder_owner, user_exists, RepoError, RepoResult,
};
use crate::model::folder::FolderId;
use crate::model::task::{
    FolderFilter, NewTask, Task, TaskCollaborator, TaskId, TaskPatch, TaskStatus,
};
use crate::model::user::UserId;
use crate::model::EntityKind;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const TASK_SELECT_SQL: &str = "SELECT
    t.id AS id,
    t.title AS title,
    t.description AS description,
    t.status AS status,
    t.due_date AS due_date,
    t.folder_id AS folder_id,
    t.user_id AS user_id,
    t.created_at AS created_at,
    t.updated_at AS updated_at
FROM tasks t";

/// Repository interface for tasks and task collaboration.
pub trait TaskRepository {
    /// Inserts one task. The title must already be normalized.
    fn create_task(&self, task: &NewTask) -> RepoResult<Task>;
    /// Loads one task by id.
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Lists tasks owned by or shared with `user_id`, optionally by folder.
    fn list_visible_tasks(&self, user_id: UserId, filter: FolderFilter) -> RepoResult<Vec<Task>>;
    /// Applies a patch. The title, when present, must already be normalized.
    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> RepoResult<Task>;
    /// Deletes one task with its collaborators and reminders.
    ///
    /// Returns `false` when the task does not exist.
    fn delete_task_cascade(&self, id: TaskId) -> RepoResult<bool>;
    /// Inserts one collaborator grant; a duplicate pair is a `Conflict`.
    fn add_collaborator(&self, task_id: TaskId, user_id: UserId) -> RepoResult<TaskCollaborator>;
    /// Lists collaborator grants of one task.
    fn list_collaborators(&self, task_id: TaskId) -> RepoResult<Vec<TaskCollaborator>>;
    /// Returns whether the user row exists.
    fn user_exists(&self, user_id: UserId) -> RepoResult<bool>;
    /// Loads the owner of one folder, if the folder exists.
    fn folder_owner(&self, folder_id: FolderId) -> RepoResult<Option<UserId>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &NewTask) -> RepoResult<Task> {
        self.conn.execute(
            "INSERT INTO tasks (
                title,
                description,
                status,
                due_date,
                folder_id,
                user_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                task.title.as_str(),
                task.description.as_deref(),
                task_status_to_db(task.status),
                task.due_date,
                task.folder_id,
                task.user_id,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        load_required_task(self.conn, id)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        load_task(self.conn, id)
    }

    fn list_visible_tasks(&self, user_id: UserId, filter: FolderFilter) -> RepoResult<Vec<Task>> {
        let mut sql = format!(
            "{TASK_SELECT_SQL}
             WHERE (
                t.user_id = ?
                OR EXISTS(
                    SELECT 1
                    FROM task_collaborators c
                    WHERE c.task_id = t.id
                      AND c.user_id = ?
                )
             )"
        );
        let mut bind_values = vec![Value::Integer(user_id), Value::Integer(user_id)];

        match filter {
            FolderFilter::Any => {}
            FolderFilter::Unfiled => sql.push_str(" AND t.folder_id IS NULL"),
            FolderFilter::In(folder_id) => {
                sql.push_str(" AND t.folder_id = ?");
                bind_values.push(Value::Integer(folder_id));
            }
        }
        sql.push_str(" ORDER BY t.id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> RepoResult<Task> {
        let mut assignments = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(title) = &patch.title {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(description) = &patch.description {
            assignments.push("description = ?");
            bind_values.push(description.clone().map_or(Value::Null, Value::Text));
        }
        if let Some(status) = patch.status {
            assignments.push("status = ?");
            bind_values.push(Value::Text(task_status_to_db(status).to_string()));
        }
        if let Some(due_date) = patch.due_date {
            assignments.push("due_date = ?");
            bind_values.push(due_date.map_or(Value::Null, Value::Integer));
        }
        if let Some(folder_id) = patch.folder_id {
            assignments.push("folder_id = ?");
            bind_values.push(folder_id.map_or(Value::Null, Value::Integer));
        }

        if assignments.is_empty() {
            return load_required_task(self.conn, id);
        }

        assignments.push("updated_at = (strftime('%s', 'now') * 1000)");
        bind_values.push(Value::Integer(id));
        let changed = self.conn.execute(
            &format!("UPDATE tasks SET {} WHERE id = ?;", assignments.join(", ")),
            params_from_iter(bind_values),
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityKind::Task, id));
        }
        load_required_task(self.conn, id)
    }

    fn delete_task_cascade(&self, id: TaskId) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let collaborators = tx.execute("DELETE FROM task_collaborators WHERE task_id = ?1;", [id])?;
        let reminders = tx.execute("DELETE FROM reminders WHERE task_id = ?1;", [id])?;
        let deleted = tx.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        tx.commit()?;

        if deleted > 0 {
            debug!(
                "event=task_delete module=repo status=ok task_id={} collaborators={} reminders={}",
                id, collaborators, reminders
            );
        }
        Ok(deleted > 0)
    }

    fn add_collaborator(&self, task_id: TaskId, user_id: UserId) -> RepoResult<TaskCollaborator> {
        self.conn
            .execute(
                "INSERT INTO task_collaborators (task_id, user_id) VALUES (?1, ?2);",
                params![task_id, user_id],
            )
            .map_err(|err| conflict_on_unique(err, EntityKind::TaskCollaborator))?;
        let id = self.conn.last_insert_rowid();
        let collaborator = self.conn.query_row(
            "SELECT id, task_id, user_id, created_at
             FROM task_collaborators
             WHERE id = ?1;",
            [id],
            parse_collaborator_row,
        )?;
        Ok(collaborator)
    }

    fn list_collaborators(&self, task_id: TaskId) -> RepoResult<Vec<TaskCollaborator>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, user_id, created_at
             FROM task_collaborators
             WHERE task_id = ?1
             ORDER BY id ASC;",
        )?;
        let collaborators = stmt
            .query_map([task_id], parse_collaborator_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(collaborators)
    }

    fn user_exists(&self, user_id: UserId) -> RepoResult<bool> {
        user_exists(self.conn, user_id)
    }

    fn folder_owner(&self, folder_id: FolderId) -> RepoResult<Option<UserId>> {
        folder_owner(self.conn, folder_id)
    }
}

fn load_task(conn: &Connection, id: TaskId) -> RepoResult<Option<Task>> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE t.id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_task_row(row)?));
    }
    Ok(None)
}

fn load_required_task(conn: &Connection, id: TaskId) -> RepoResult<Task> {
    load_task(conn, id)?.ok_or(RepoError::NotFound(EntityKind::Task, id))
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let status_text: String = row.get("status")?;
    let status = parse_task_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status,
        due_date: row.get("due_date")?,
        folder_id: row.get("folder_id")?,
        user_id: row.get("user_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_collaborator_row(row: &Row<'_>) -> rusqlite::Result<TaskCollaborator> {
    Ok(TaskCollaborator {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        user_id: row.get("user_id")?,
        created_at: row.get("created_at")?,
    })
}

fn task_status_to_db(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "todo",
        TaskStatus::InProgress => "in_progress",
        TaskStatus::Completed => "completed",
    }
}

fn parse_task_status(value: &str) -> Option<TaskStatus> {
    match value {
        "todo" => Some(TaskStatus::Todo),
        "in_progress" => Some(TaskStatus::InProgress),
        "completed" => Some(TaskStatus::Completed),
        _ => None,
    }
}
