//! Business logic helpers for managing office tasks.

use std::cmp::Ordering;

use chrono::NaiveDate;
use uuid::Uuid;

use cc_domain::{FollowUp, Office, SubTask, Task, TaskStatus};

use crate::{draft::TaskDraft, recurrence_service::RecurrenceService, time::Clock, CoreError};

/// Result of completing several tasks at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkCompletion {
    pub completed: usize,
    /// Ids of next occurrences created for recurring tasks.
    pub spawned: Vec<Uuid>,
}

/// Provides validated CRUD and lifecycle helpers for office tasks.
pub struct TaskService;

impl TaskService {
    /// Adds an already-built task and returns its identifier.
    pub fn add(office: &mut Office, task: Task) -> Result<Uuid, CoreError> {
        if task.title.trim().is_empty() {
            return Err(CoreError::Validation("title: This field is required.".into()));
        }
        if task.recurrence.is_some() && task.due_date.is_none() {
            return Err(CoreError::Validation(
                "due_date: A due date is required for recurring tasks.".into(),
            ));
        }
        let id = office.add_task(task);
        tracing::debug!(task = %id, "task added");
        Ok(id)
    }

    /// Validates a draft and stores the resulting task.
    pub fn create(office: &mut Office, draft: TaskDraft, clock: &dyn Clock) -> Result<Uuid, CoreError> {
        let task = draft.into_task(clock.now())?;
        Self::add(office, task)
    }

    /// Updates the task identified by `id` via the provided mutator.
    ///
    /// The edit is rolled back when it leaves a recurring task without a due date.
    pub fn update<F>(
        office: &mut Office,
        id: Uuid,
        clock: &dyn Clock,
        mutator: F,
    ) -> Result<(), CoreError>
    where
        F: FnOnce(&mut Task),
    {
        let task = office.task_mut(id).ok_or(CoreError::TaskNotFound(id))?;
        let snapshot = task.clone();
        mutator(task);
        if task.title.trim().is_empty() || (task.recurrence.is_some() && task.due_date.is_none()) {
            *task = snapshot;
            return Err(CoreError::Validation(
                "task edit would leave it without a title or a due date for its recurrence".into(),
            ));
        }
        task.updated_at = clock.now();
        office.touch();
        Ok(())
    }

    /// Removes the task identified by `id`, returning the removed instance.
    pub fn remove(office: &mut Office, id: Uuid) -> Result<Task, CoreError> {
        office.remove_task(id).ok_or(CoreError::TaskNotFound(id))
    }

    /// Tasks ordered by due date (undated last), then priority.
    pub fn list(office: &Office) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = office.tasks.iter().collect();
        tasks.sort_by(|a, b| compare_due(a.due_date, b.due_date).then(a.priority.cmp(&b.priority)));
        tasks
    }

    /// Changes a task's status.
    ///
    /// Moving a recurring task into `Complete` creates its next occurrence,
    /// whose id is returned. Saving a task that is already complete does not.
    pub fn set_status(
        office: &mut Office,
        id: Uuid,
        status: TaskStatus,
        clock: &dyn Clock,
    ) -> Result<Option<Uuid>, CoreError> {
        let task = office.task_mut(id).ok_or(CoreError::TaskNotFound(id))?;
        let previous = task.status;
        if previous == status {
            return Ok(None);
        }
        task.set_status(status, clock.now());
        office.touch();
        tracing::debug!(task = %id, from = %previous, to = %status, "task status changed");
        if status == TaskStatus::Complete {
            RecurrenceService::apply_to_task(office, id, clock)
        } else {
            Ok(None)
        }
    }

    /// Flips a task between complete and not started.
    pub fn toggle_complete(
        office: &mut Office,
        id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Option<Uuid>, CoreError> {
        let task = office.task(id).ok_or(CoreError::TaskNotFound(id))?;
        let target = if task.is_complete() {
            TaskStatus::NotStarted
        } else {
            TaskStatus::Complete
        };
        Self::set_status(office, id, target, clock)
    }

    /// Completes every listed task that is not already complete.
    ///
    /// All ids are checked before any task changes.
    pub fn bulk_complete(
        office: &mut Office,
        ids: &[Uuid],
        clock: &dyn Clock,
    ) -> Result<BulkCompletion, CoreError> {
        if let Some(missing) = ids.iter().find(|id| office.task(**id).is_none()) {
            return Err(CoreError::TaskNotFound(*missing));
        }
        let mut outcome = BulkCompletion::default();
        for id in ids {
            let already_complete = office.task(*id).is_some_and(Task::is_complete);
            if already_complete {
                continue;
            }
            if let Some(spawned) = Self::set_status(office, *id, TaskStatus::Complete, clock)? {
                outcome.spawned.push(spawned);
            }
            outcome.completed += 1;
        }
        tracing::info!(
            completed = outcome.completed,
            spawned = outcome.spawned.len(),
            "bulk completion finished"
        );
        Ok(outcome)
    }

    /// Sets or clears the due date. Recurring tasks must keep one.
    pub fn set_due_date(
        office: &mut Office,
        id: Uuid,
        due_date: Option<NaiveDate>,
        clock: &dyn Clock,
    ) -> Result<(), CoreError> {
        let task = office.task_mut(id).ok_or(CoreError::TaskNotFound(id))?;
        if due_date.is_none() && task.recurrence.is_some() {
            return Err(CoreError::Validation(
                "due_date: A due date is required for recurring tasks.".into(),
            ));
        }
        task.due_date = due_date;
        if due_date.is_none() {
            task.due_time = None;
        }
        task.updated_at = clock.now();
        office.touch();
        Ok(())
    }

    /// Appends a checklist item at the end of the task's checklist.
    pub fn add_subtask(
        office: &mut Office,
        id: Uuid,
        title: &str,
        clock: &dyn Clock,
    ) -> Result<Uuid, CoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CoreError::Validation("title: This field is required.".into()));
        }
        let task = office.task_mut(id).ok_or(CoreError::TaskNotFound(id))?;
        let sort_order = task
            .subtasks
            .iter()
            .map(|item| item.sort_order + 1)
            .max()
            .unwrap_or(0);
        let subtask = SubTask::new(title, sort_order);
        let subtask_id = subtask.id;
        task.subtasks.push(subtask);
        task.updated_at = clock.now();
        office.touch();
        Ok(subtask_id)
    }

    /// Flips a checklist item, returning its new completion state.
    pub fn toggle_subtask(
        office: &mut Office,
        id: Uuid,
        subtask_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<bool, CoreError> {
        let task = office.task_mut(id).ok_or(CoreError::TaskNotFound(id))?;
        let item = task
            .subtasks
            .iter_mut()
            .find(|item| item.id == subtask_id)
            .ok_or_else(|| CoreError::InvalidOperation(format!("subtask {subtask_id} not found")))?;
        item.is_completed = !item.is_completed;
        let state = item.is_completed;
        task.updated_at = clock.now();
        office.touch();
        Ok(state)
    }

    /// Logs an outreach on a task.
    pub fn add_follow_up(
        office: &mut Office,
        id: Uuid,
        follow_up: FollowUp,
        clock: &dyn Clock,
    ) -> Result<Uuid, CoreError> {
        let task = office.task_mut(id).ok_or(CoreError::TaskNotFound(id))?;
        let follow_up_id = follow_up.id;
        task.follow_ups.push(follow_up);
        task.updated_at = clock.now();
        office.touch();
        Ok(follow_up_id)
    }

    /// Marks a follow-up as answered.
    pub fn record_follow_up_response(
        office: &mut Office,
        id: Uuid,
        follow_up_id: Uuid,
        notes: &str,
        clock: &dyn Clock,
    ) -> Result<(), CoreError> {
        let now = clock.now();
        let task = office.task_mut(id).ok_or(CoreError::TaskNotFound(id))?;
        let follow_up = task
            .follow_ups
            .iter_mut()
            .find(|item| item.id == follow_up_id)
            .ok_or_else(|| {
                CoreError::InvalidOperation(format!("follow-up {follow_up_id} not found"))
            })?;
        follow_up.record_response(now, notes.trim());
        task.updated_at = now;
        office.touch();
        Ok(())
    }
}

fn compare_due(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;
    use cc_domain::{RecurrenceRule, TaskPriority};
    use chrono::{TimeZone, Utc};

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 3, 5, 14, 0, 0).unwrap())
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn recurring_office() -> (Office, Uuid) {
        let mut office = Office::new("Tasks");
        let task = Task::new("Pay rent", clock().0)
            .with_due_date(day(2026, 3, 1))
            .with_recurrence(RecurrenceRule::Monthly);
        let id = TaskService::add(&mut office, task).unwrap();
        (office, id)
    }

    #[test]
    fn completing_recurring_task_spawns_next_once() {
        let (mut office, id) = recurring_office();

        let spawned = TaskService::set_status(&mut office, id, TaskStatus::Complete, &clock())
            .unwrap()
            .expect("next occurrence");
        assert_eq!(office.task(spawned).unwrap().due_date, Some(day(2026, 4, 1)));

        let again = TaskService::set_status(&mut office, id, TaskStatus::Complete, &clock()).unwrap();
        assert!(again.is_none());
        assert_eq!(office.tasks.len(), 2);

        let original = office.task(id).unwrap();
        assert_eq!(original.completed_at, Some(clock().0));
        assert_eq!(original.due_date, Some(day(2026, 3, 1)));
    }

    #[test]
    fn reopening_clears_completion_timestamp() {
        let (mut office, id) = recurring_office();
        TaskService::toggle_complete(&mut office, id, &clock()).unwrap();
        TaskService::toggle_complete(&mut office, id, &clock()).unwrap();
        let task = office.task(id).unwrap();
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn bulk_complete_skips_finished_tasks() {
        let (mut office, recurring) = recurring_office();
        let plain = TaskService::add(&mut office, Task::new("Call agent", clock().0)).unwrap();
        let done = TaskService::add(&mut office, Task::new("Shred mail", clock().0)).unwrap();
        TaskService::set_status(&mut office, done, TaskStatus::Complete, &clock()).unwrap();

        let outcome =
            TaskService::bulk_complete(&mut office, &[recurring, plain, done], &clock()).unwrap();

        assert_eq!(outcome.completed, 2);
        assert_eq!(outcome.spawned.len(), 1);
        assert_eq!(office.tasks.len(), 4);
    }

    #[test]
    fn bulk_complete_rejects_unknown_ids_before_changing_anything() {
        let (mut office, id) = recurring_office();
        let err = TaskService::bulk_complete(&mut office, &[id, Uuid::new_v4()], &clock())
            .expect_err("unknown id");
        assert!(matches!(err, CoreError::TaskNotFound(_)));
        assert!(!office.task(id).unwrap().is_complete());
    }

    #[test]
    fn recurring_task_keeps_its_due_date() {
        let (mut office, id) = recurring_office();
        let err = TaskService::set_due_date(&mut office, id, None, &clock()).expect_err("rejected");
        assert!(matches!(err, CoreError::Validation(_)));

        let err = TaskService::update(&mut office, id, &clock(), |task| task.due_date = None)
            .expect_err("rejected");
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(office.task(id).unwrap().due_date, Some(day(2026, 3, 1)));
    }

    #[test]
    fn created_tasks_take_their_timestamps_from_the_clock() {
        let mut office = Office::new("Stamps");
        let id = TaskService::create(&mut office, TaskDraft::new("Book inspection"), &clock()).unwrap();
        let task = office.task(id).unwrap();
        assert_eq!(task.created_at, clock().0);
        assert_eq!(task.updated_at, clock().0);
    }

    #[test]
    fn list_orders_by_due_date_then_priority() {
        let mut office = Office::new("Tasks");
        TaskService::add(&mut office, Task::new("Someday", clock().0)).unwrap();
        TaskService::add(
            &mut office,
            Task::new("Low", clock().0)
                .with_due_date(day(2026, 3, 2))
                .with_priority(TaskPriority::Low),
        )
        .unwrap();
        TaskService::add(
            &mut office,
            Task::new("Critical", clock().0)
                .with_due_date(day(2026, 3, 2))
                .with_priority(TaskPriority::Critical),
        )
        .unwrap();
        TaskService::add(
            &mut office,
            Task::new("Early", clock().0).with_due_date(day(2026, 3, 1)),
        )
        .unwrap();

        let titles: Vec<_> = TaskService::list(&office).iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Early", "Critical", "Low", "Someday"]);
    }

    #[test]
    fn subtasks_and_follow_ups_are_tracked() {
        let (mut office, id) = recurring_office();
        let first = TaskService::add_subtask(&mut office, id, "Gather receipts", &clock()).unwrap();
        TaskService::add_subtask(&mut office, id, "Sign form", &clock()).unwrap();
        assert!(TaskService::toggle_subtask(&mut office, id, first, &clock()).unwrap());
        assert_eq!(office.task(id).unwrap().checklist_progress(), (1, 2));
        assert_eq!(office.task(id).unwrap().subtasks[1].sort_order, 1);

        let follow_up = FollowUp::new(clock().0, "phone");
        let follow_up_id = TaskService::add_follow_up(&mut office, id, follow_up, &clock()).unwrap();
        TaskService::record_follow_up_response(&mut office, id, follow_up_id, " Confirmed ", &clock())
            .unwrap();
        let stored = &office.task(id).unwrap().follow_ups[0];
        assert!(stored.response_received);
        assert_eq!(stored.response_notes, "Confirmed");
    }
}
