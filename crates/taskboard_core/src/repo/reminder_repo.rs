//! Reminder ledger repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist reminders and answer the "what is due now" query.
//! - Perform the one-way `is_sent` transition as a compare-and-set.
//!
//! # Invariants
//! - Pending listing is global and ordered by `reminder_time ASC, id ASC`.
//! - `mark_dispatched` is one conditional `UPDATE`; of any number of
//!   concurrent callers, exactly one observes the transition.

use super::{bool_to_int, ensure_connection_ready, int_to_bool, RepoError, RepoResult};
use crate::model::reminder::{NewReminder, Reminder, ReminderId};
use crate::model::task::TaskId;
use crate::model::{EntityKind, EpochMs};
use rusqlite::{params, Connection, Row};

const REMINDER_SELECT_SQL: &str = "SELECT
    id,
    task_id,
    user_id,
    reminder_time,
    is_sent,
    created_at
FROM reminders";

/// Repository interface for the reminder ledger.
pub trait ReminderRepository {
    /// Inserts one reminder with `is_sent = false`.
    fn create_reminder(&self, reminder: &NewReminder) -> RepoResult<Reminder>;
    /// Loads one reminder by id.
    fn get_reminder(&self, id: ReminderId) -> RepoResult<Option<Reminder>>;
    /// Lists unsent reminders with `reminder_time <= now`.
    fn list_pending(&self, now: EpochMs) -> RepoResult<Vec<Reminder>>;
    /// Lists every reminder bound to one task.
    fn list_for_task(&self, task_id: TaskId) -> RepoResult<Vec<Reminder>>;
    /// Flips `is_sent` from `false` to `true`.
    ///
    /// Returns `true` when this call performed the transition and `false`
    /// when the reminder was already dispatched.
    fn mark_dispatched(&self, id: ReminderId) -> RepoResult<bool>;
}

/// SQLite-backed reminder repository.
pub struct SqliteReminderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReminderRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ReminderRepository for SqliteReminderRepository<'_> {
    fn create_reminder(&self, reminder: &NewReminder) -> RepoResult<Reminder> {
        self.conn.execute(
            "INSERT INTO reminders (task_id, user_id, reminder_time, is_sent)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                reminder.task_id,
                reminder.user_id,
                reminder.reminder_time,
                bool_to_int(false),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_reminder(id)?
            .ok_or(RepoError::NotFound(EntityKind::Reminder, id))
    }

    fn get_reminder(&self, id: ReminderId) -> RepoResult<Option<Reminder>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REMINDER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_reminder_row(row)?));
        }
        Ok(None)
    }

    fn list_pending(&self, now: EpochMs) -> RepoResult<Vec<Reminder>> {
        self.collect(
            &format!(
                "{REMINDER_SELECT_SQL}
                 WHERE is_sent = 0
                   AND reminder_time <= ?1
                 ORDER BY reminder_time ASC, id ASC;"
            ),
            now,
        )
    }

    fn list_for_task(&self, task_id: TaskId) -> RepoResult<Vec<Reminder>> {
        self.collect(
            &format!(
                "{REMINDER_SELECT_SQL}
                 WHERE task_id = ?1
                 ORDER BY reminder_time ASC, id ASC;"
            ),
            task_id,
        )
    }

    fn mark_dispatched(&self, id: ReminderId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE reminders
             SET is_sent = 1
             WHERE id = ?1
               AND is_sent = 0;",
            [id],
        )?;
        if changed == 1 {
            return Ok(true);
        }

        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM reminders WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        if exists == 1 {
            Ok(false)
        } else {
            Err(RepoError::NotFound(EntityKind::Reminder, id))
        }
    }
}

impl SqliteReminderRepository<'_> {
    fn collect(&self, sql: &str, param: i64) -> RepoResult<Vec<Reminder>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([param])?;
        let mut reminders = Vec::new();
        while let Some(row) = rows.next()? {
            reminders.push(parse_reminder_row(row)?);
        }
        Ok(reminders)
    }
}

fn parse_reminder_row(row: &Row<'_>) -> RepoResult<Reminder> {
    Ok(Reminder {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        user_id: row.get("user_id")?,
        reminder_time: row.get("reminder_time")?,
        is_sent: int_to_bool(row.get("is_sent")?, "reminders.is_sent")?,
        created_at: row.get("created_at")?,
    })
}
