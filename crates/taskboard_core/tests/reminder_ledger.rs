use taskboard_core::db::open_db_in_memory;
use taskboard_core::{
    now_epoch_ms, EntityKind, NewReminder, NewTask, Reminder, ReminderService, ReminderState,
    ServiceError, SqliteReminderRepository, SqliteTaskRepository, SqliteUserRepository,
    TaskService, UserRepository,
};

const NOW: i64 = 1_700_000_000_000;

struct Fixture {
    conn: rusqlite::Connection,
    user_id: i64,
    task_id: i64,
}

fn setup() -> Fixture {
    let conn = open_db_in_memory().unwrap();
    let user_id = SqliteUserRepository::try_new(&conn)
        .unwrap()
        .create_user("ada@example.com", "Ada", "opaque")
        .unwrap()
        .id;
    let task_id = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap())
        .create_task(&NewTask::titled("remember me", user_id))
        .unwrap()
        .id;
    Fixture {
        conn,
        user_id,
        task_id,
    }
}

fn schedule(
    service: &ReminderService<SqliteReminderRepository<'_>>,
    fx: &Fixture,
    at: i64,
) -> Reminder {
    service
        .create_reminder(&NewReminder {
            task_id: fx.task_id,
            user_id: fx.user_id,
            reminder_time: at,
        })
        .unwrap()
}

#[test]
fn create_reminder_starts_unsent() {
    let fx = setup();
    let service = ReminderService::new(SqliteReminderRepository::try_new(&fx.conn).unwrap());

    let reminder = schedule(&service, &fx, NOW + 60_000);
    assert!(!reminder.is_sent);
    assert_eq!(reminder.reminder_time, NOW + 60_000);
    assert_eq!(reminder.state_at(NOW), ReminderState::Scheduled);
    assert_eq!(service.get_reminder(reminder.id).unwrap(), reminder);
}

#[test]
fn create_reminder_for_missing_task_is_a_storage_error() {
    let fx = setup();
    let service = ReminderService::new(SqliteReminderRepository::try_new(&fx.conn).unwrap());

    let err = service
        .create_reminder(&NewReminder {
            task_id: 4242,
            user_id: fx.user_id,
            reminder_time: NOW,
        })
        .unwrap_err();
    assert!(matches!(err, ServiceError::Repo(_)));
    assert_eq!(err.code(), "storage");
}

#[test]
fn pending_means_unsent_and_due() {
    let fx = setup();
    let service = ReminderService::new(SqliteReminderRepository::try_new(&fx.conn).unwrap());

    let late = schedule(&service, &fx, NOW - 5_000);
    let exactly_now = schedule(&service, &fx, NOW);
    let future = schedule(&service, &fx, NOW + 1);
    let already_sent = schedule(&service, &fx, NOW - 10_000);
    assert!(service.mark_dispatched(already_sent.id).unwrap());

    let pending: Vec<i64> = service
        .get_pending_reminders_at(NOW)
        .unwrap()
        .iter()
        .map(|reminder| reminder.id)
        .collect();
    assert_eq!(pending, vec![late.id, exactly_now.id]);
    assert!(!pending.contains(&future.id));
    assert!(!pending.contains(&already_sent.id));
}

#[test]
fn pending_orders_by_time_then_id() {
    let fx = setup();
    let service = ReminderService::new(SqliteReminderRepository::try_new(&fx.conn).unwrap());

    let second = schedule(&service, &fx, NOW - 1_000);
    let first = schedule(&service, &fx, NOW - 2_000);
    let tie = schedule(&service, &fx, NOW - 1_000);

    let pending: Vec<i64> = service
        .get_pending_reminders_at(NOW)
        .unwrap()
        .iter()
        .map(|reminder| reminder.id)
        .collect();
    assert_eq!(pending, vec![first.id, second.id, tie.id]);
}

#[test]
fn pending_uses_the_wall_clock_by_default() {
    let fx = setup();
    let service = ReminderService::new(SqliteReminderRepository::try_new(&fx.conn).unwrap());

    let overdue = schedule(&service, &fx, now_epoch_ms() - 1_000);
    schedule(&service, &fx, now_epoch_ms() + 3_600_000);

    let pending = service.get_pending_reminders().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, overdue.id);
}

#[test]
fn mark_dispatched_transitions_once() {
    let fx = setup();
    let service = ReminderService::new(SqliteReminderRepository::try_new(&fx.conn).unwrap());
    let reminder = schedule(&service, &fx, NOW);

    assert!(service.mark_dispatched(reminder.id).unwrap());
    assert!(!service.mark_dispatched(reminder.id).unwrap());

    let stored = service.get_reminder(reminder.id).unwrap();
    assert!(stored.is_sent);
    assert_eq!(stored.state_at(NOW), ReminderState::Dispatched);
    assert!(service.get_pending_reminders_at(NOW).unwrap().is_empty());
}

#[test]
fn mark_dispatched_unknown_reminder_is_not_found() {
    let fx = setup();
    let service = ReminderService::new(SqliteReminderRepository::try_new(&fx.conn).unwrap());

    assert!(matches!(
        service.mark_dispatched(31337).unwrap_err(),
        ServiceError::NotFound(EntityKind::Reminder, 31337)
    ));
}

#[test]
fn sweep_marks_delivered_and_keeps_failed_pending() {
    let fx = setup();
    let service = ReminderService::new(SqliteReminderRepository::try_new(&fx.conn).unwrap());
    let delivered = schedule(&service, &fx, NOW - 2);
    let broken = schedule(&service, &fx, NOW - 1);
    schedule(&service, &fx, NOW + 1);

    let mut seen = Vec::new();
    let mut notifier = |reminder: &Reminder| {
        seen.push(reminder.id);
        if reminder.id == broken.id {
            Err("smtp unavailable".to_string())
        } else {
            Ok(())
        }
    };
    let report = service.sweep_at(NOW, &mut notifier).unwrap();

    assert_eq!(seen, vec![delivered.id, broken.id]);
    assert_eq!(report.due, 2);
    assert_eq!(report.dispatched, vec![delivered.id]);
    assert!(report.already_dispatched.is_empty());
    assert_eq!(
        report.failed,
        vec![(broken.id, "smtp unavailable".to_string())]
    );

    let still_pending: Vec<i64> = service
        .get_pending_reminders_at(NOW)
        .unwrap()
        .iter()
        .map(|reminder| reminder.id)
        .collect();
    assert_eq!(still_pending, vec![broken.id]);
}

#[test]
fn second_sweep_does_not_redeliver() {
    let fx = setup();
    let service = ReminderService::new(SqliteReminderRepository::try_new(&fx.conn).unwrap());
    schedule(&service, &fx, NOW);

    let mut deliveries = 0;
    let mut notifier = |_: &Reminder| -> Result<(), String> {
        deliveries += 1;
        Ok(())
    };
    let first = service.sweep_at(NOW, &mut notifier).unwrap();
    let second = service.sweep_at(NOW + 1_000, &mut notifier).unwrap();

    assert_eq!(first.dispatched.len(), 1);
    assert_eq!(second, Default::default());
    assert_eq!(deliveries, 1);
}

#[test]
fn sweep_reports_reminders_marked_by_someone_else() {
    let fx = setup();
    let service = ReminderService::new(SqliteReminderRepository::try_new(&fx.conn).unwrap());
    let racer = ReminderService::new(SqliteReminderRepository::try_new(&fx.conn).unwrap());
    let reminder = schedule(&service, &fx, NOW);

    let mut notifier = |due: &Reminder| {
        // A concurrent poller wins the compare-and-set while we deliver.
        racer
            .mark_dispatched(due.id)
            .map(|_| ())
            .map_err(|err| err.to_string())
    };
    let report = service.sweep_at(NOW, &mut notifier).unwrap();

    assert!(report.dispatched.is_empty());
    assert_eq!(report.already_dispatched, vec![reminder.id]);
}

#[test]
fn many_reminders_per_task_are_listed() {
    let fx = setup();
    let service = ReminderService::new(SqliteReminderRepository::try_new(&fx.conn).unwrap());
    let a = schedule(&service, &fx, NOW + 10);
    let b = schedule(&service, &fx, NOW + 20);

    let ids: Vec<i64> = service
        .list_for_task(fx.task_id)
        .unwrap()
        .iter()
        .map(|reminder| reminder.id)
        .collect();
    assert_eq!(ids, vec![a.id, b.id]);
}

#[test]
fn sweep_continues_past_reminders_deleted_with_their_task() {
    let fx = setup();
    let tasks = TaskService::new(SqliteTaskRepository::try_new(&fx.conn).unwrap());
    let service = ReminderService::new(SqliteReminderRepository::try_new(&fx.conn).unwrap());
    let other_task = tasks
        .create_task(&NewTask::titled("other", fx.user_id))
        .unwrap();

    let doomed = schedule(&service, &fx, NOW - 2);
    let survivor = service
        .create_reminder(&NewReminder {
            task_id: other_task.id,
            user_id: fx.user_id,
            reminder_time: NOW - 1,
        })
        .unwrap();

    let mut delivered = Vec::new();
    let mut notifier = |due: &Reminder| -> Result<(), String> {
        delivered.push(due.id);
        if due.task_id == fx.task_id {
            // Task removed by another handler while this reminder is in flight.
            tasks.delete_task(due.task_id).map_err(|err| err.to_string())?;
        }
        Ok(())
    };
    let report = service.sweep_at(NOW, &mut notifier).unwrap();

    assert_eq!(delivered, vec![doomed.id, survivor.id]);
    assert_eq!(report.due, 2);
    assert_eq!(report.vanished, vec![doomed.id]);
    assert_eq!(report.dispatched, vec![survivor.id]);
    assert!(report.failed.is_empty());
    assert!(service.get_pending_reminders_at(NOW).unwrap().is_empty());
}
