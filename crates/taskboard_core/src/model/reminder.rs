//! Reminder ledger model.
//!
//! # Invariants
//! - `is_sent` only ever moves from `false` to `true`.
//! - "Pending" is derived from `reminder_time` and the clock; it is not stored.

use super::task::TaskId;
use super::user::UserId;
use super::EpochMs;
use serde::{Deserialize, Serialize};

/// Stable reminder identifier.
pub type ReminderId = i64;

/// Persisted reminder record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub task_id: TaskId,
    pub user_id: UserId,
    pub reminder_time: EpochMs,
    pub is_sent: bool,
    pub created_at: EpochMs,
}

/// Reminder creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewReminder {
    pub task_id: TaskId,
    pub user_id: UserId,
    pub reminder_time: EpochMs,
}

/// Lifecycle state of a reminder at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderState {
    /// Not sent, due in the future.
    Scheduled,
    /// Not sent, due now or in the past.
    Pending,
    /// Delivered; terminal.
    Dispatched,
}

impl Reminder {
    /// Derives the lifecycle state relative to `now`.
    pub fn state_at(&self, now: EpochMs) -> ReminderState {
        if self.is_sent {
            ReminderState::Dispatched
        } else if self.reminder_time <= now {
            ReminderState::Pending
        } else {
            ReminderState::Scheduled
        }
    }
}
