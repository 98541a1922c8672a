//! Reminder ledger use-case service.
//!
//! # Responsibility
//! - Schedule reminders and report which ones are due.
//! - Run a dispatch sweep: hand each due reminder to a notifier, then mark it
//!   dispatched.
//!
//! # Invariants
//! - A reminder is marked dispatched only after its notifier call succeeds.
//! - Marking is a storage compare-and-set, so overlapping sweeps never both
//!   record the same dispatch.
//! - A failed notification leaves the reminder pending for the next sweep.

use crate::model::reminder::{NewReminder, Reminder, ReminderId};
use crate::model::task::TaskId;
use crate::model::{now_epoch_ms, EntityKind, EpochMs};
use crate::repo::reminder_repo::ReminderRepository;
use crate::repo::RepoError;
use crate::service::error::{ServiceError, ServiceResult};
use log::{debug, info, warn};

/// Delivery boundary for due reminders.
///
/// The core never delivers anything itself; push/email/OS delivery lives
/// behind this trait.
pub trait ReminderNotifier {
    /// Delivers one reminder. An `Err` keeps the reminder pending.
    fn notify(&mut self, reminder: &Reminder) -> Result<(), String>;
}

impl<F> ReminderNotifier for F
where
    F: FnMut(&Reminder) -> Result<(), String>,
{
    fn notify(&mut self, reminder: &Reminder) -> Result<(), String> {
        self(reminder)
    }
}

/// Outcome of one dispatch sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Number of reminders that were due when the sweep started.
    pub due: usize,
    /// Reminders this sweep delivered and marked.
    pub dispatched: Vec<ReminderId>,
    /// Reminders delivered here but already marked by a concurrent sweep.
    pub already_dispatched: Vec<ReminderId>,
    /// Reminders whose notification failed, with the notifier's message.
    pub failed: Vec<(ReminderId, String)>,
    /// Reminders deleted with their task before they could be marked.
    pub vanished: Vec<ReminderId>,
}

/// Reminder service facade.
pub struct ReminderService<R: ReminderRepository> {
    repo: R,
}

impl<R: ReminderRepository> ReminderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Schedules one reminder with `is_sent = false`.
    ///
    /// Task and user references are checked by storage foreign keys only.
    pub fn create_reminder(&self, request: &NewReminder) -> ServiceResult<Reminder> {
        let reminder = self.repo.create_reminder(request)?;
        info!(
            "event=reminder_create module=service status=ok reminder_id={} task_id={} user_id={}",
            reminder.id, reminder.task_id, reminder.user_id
        );
        Ok(reminder)
    }

    /// Loads one reminder.
    pub fn get_reminder(&self, id: ReminderId) -> ServiceResult<Reminder> {
        self.repo
            .get_reminder(id)?
            .ok_or(ServiceError::NotFound(EntityKind::Reminder, id))
    }

    /// Lists every reminder bound to one task.
    pub fn list_for_task(&self, task_id: TaskId) -> ServiceResult<Vec<Reminder>> {
        Ok(self.repo.list_for_task(task_id)?)
    }

    /// Lists all undelivered reminders that are due at the current time.
    ///
    /// Not scoped to any user; callers filter by `user_id` themselves.
    pub fn get_pending_reminders(&self) -> ServiceResult<Vec<Reminder>> {
        self.get_pending_reminders_at(now_epoch_ms())
    }

    /// Same as `get_pending_reminders` with an explicit clock.
    pub fn get_pending_reminders_at(&self, now: EpochMs) -> ServiceResult<Vec<Reminder>> {
        Ok(self.repo.list_pending(now)?)
    }

    /// Marks one reminder dispatched.
    ///
    /// Returns `true` when this call performed the transition and `false`
    /// when it was already dispatched.
    pub fn mark_dispatched(&self, id: ReminderId) -> ServiceResult<bool> {
        let transitioned = self.repo.mark_dispatched(id)?;
        debug!(
            "event=reminder_dispatch module=service status=ok reminder_id={} transitioned={}",
            id, transitioned
        );
        Ok(transitioned)
    }

    /// Runs one sweep at the current time.
    pub fn sweep(&self, notifier: &mut impl ReminderNotifier) -> ServiceResult<SweepReport> {
        self.sweep_at(now_epoch_ms(), notifier)
    }

    /// Runs one sweep with an explicit clock.
    ///
    /// Storage errors abort the sweep. Notifier errors and reminders deleted
    /// mid-sweep are recorded in the report and do not stop the remaining
    /// reminders.
    pub fn sweep_at(
        &self,
        now: EpochMs,
        notifier: &mut impl ReminderNotifier,
    ) -> ServiceResult<SweepReport> {
        let pending = self.repo.list_pending(now)?;
        let mut report = SweepReport {
            due: pending.len(),
            ..SweepReport::default()
        };

        for reminder in &pending {
            if let Err(message) = notifier.notify(reminder) {
                warn!(
                    "event=reminder_notify module=service status=error reminder_id={} task_id={}",
                    reminder.id, reminder.task_id
                );
                report.failed.push((reminder.id, message));
                continue;
            }

            match self.repo.mark_dispatched(reminder.id) {
                Ok(true) => report.dispatched.push(reminder.id),
                Ok(false) => report.already_dispatched.push(reminder.id),
                Err(RepoError::NotFound(EntityKind::Reminder, id)) => {
                    debug!(
                        "event=reminder_dispatch module=service status=skipped reminder_id={} task_id={}",
                        id, reminder.task_id
                    );
                    report.vanished.push(id);
                }
                Err(err) => return Err(err.into()),
            }
        }

        info!(
            "event=reminder_sweep module=service status=ok due={} dispatched={} already_dispatched={} failed={} vanished={}",
            report.due,
            report.dispatched.len(),
            report.already_dispatched.len(),
            report.failed.len(),
            report.vanished.len()
        );
        Ok(report)
    }
}
