//! Services that continue recurrence chains and maintain recurrence rules.

use chrono::NaiveDate;
use uuid::Uuid;

use cc_domain::{Office, RecurrenceRule, ScheduledItem};

use crate::{time::Clock, CoreError};

/// Creates follow-on occurrences for recurring tasks and cash-flow entries.
///
/// Applying a recurrence appends exactly one new record built from the
/// triggering record; the trigger keeps its own date and completion state.
/// An occurrence that already has a successor is never continued again.
pub struct RecurrenceService;

impl RecurrenceService {
    /// Appends the next occurrence of a recurring task, returning its id.
    pub fn apply_to_task(
        office: &mut Office,
        task_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Option<Uuid>, CoreError> {
        let task = office
            .task(task_id)
            .ok_or(CoreError::TaskNotFound(task_id))?;
        if !task.is_recurring() {
            return Ok(None);
        }
        if office.tasks.iter().any(|other| other.recurrence_parent == Some(task_id)) {
            tracing::debug!(task = %task_id, "occurrence already continued");
            return Ok(None);
        }
        let Some(next) = task.spawn_next_recurrence(clock.now()) else {
            tracing::warn!(task = %task_id, "recurring task has no due date, chain not continued");
            return Ok(None);
        };
        tracing::info!(
            task = %task_id,
            next_due = ?next.due_date,
            rule = ?next.recurrence,
            "created next task occurrence"
        );
        Ok(Some(office.add_task(next)))
    }

    /// Appends the next occurrence of a recurring cash-flow entry, returning its id.
    pub fn apply_to_cash_flow(
        office: &mut Office,
        entry_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Option<Uuid>, CoreError> {
        let entry = office
            .cash_flow_entry(entry_id)
            .ok_or(CoreError::CashFlowEntryNotFound(entry_id))?;
        if office
            .cash_flow
            .iter()
            .any(|other| other.recurrence_parent == Some(entry_id))
        {
            tracing::debug!(entry = %entry_id, "occurrence already continued");
            return Ok(None);
        }
        let Some(next) = entry.spawn_next_recurrence(clock.now()) else {
            return Ok(None);
        };
        tracing::info!(
            entry = %entry_id,
            next_date = %next.date,
            "created next cash flow occurrence"
        );
        Ok(Some(office.add_cash_flow_entry(next)))
    }

    /// Assigns or replaces the recurrence rule of a task. Recurring tasks need a due date.
    pub fn set_task_rule(
        office: &mut Office,
        task_id: Uuid,
        rule: RecurrenceRule,
        clock: &dyn Clock,
    ) -> Result<(), CoreError> {
        let task = office
            .task_mut(task_id)
            .ok_or(CoreError::TaskNotFound(task_id))?;
        if task.due_date.is_none() {
            return Err(CoreError::Validation(
                "due_date: A due date is required for recurring tasks.".into(),
            ));
        }
        task.recurrence = Some(rule);
        task.updated_at = clock.now();
        office.touch();
        Ok(())
    }

    /// Clears the recurrence rule of a task, returning whether one was set.
    pub fn clear_task_rule(
        office: &mut Office,
        task_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<bool, CoreError> {
        let task = office
            .task_mut(task_id)
            .ok_or(CoreError::TaskNotFound(task_id))?;
        let had_rule = task.recurrence.take().is_some();
        if had_rule {
            task.updated_at = clock.now();
            office.touch();
        }
        Ok(had_rule)
    }

    /// Assigns or clears the recurrence rule of a cash-flow entry.
    pub fn set_cash_flow_rule(
        office: &mut Office,
        entry_id: Uuid,
        rule: Option<RecurrenceRule>,
    ) -> Result<(), CoreError> {
        let entry = office
            .cash_flow_entry_mut(entry_id)
            .ok_or(CoreError::CashFlowEntryNotFound(entry_id))?;
        entry.recurrence = rule;
        office.touch();
        Ok(())
    }

    /// Lists the next `count` occurrences that would follow `anchor`.
    pub fn preview(anchor: NaiveDate, rule: RecurrenceRule, count: usize) -> Vec<NaiveDate> {
        rule.occurrences_after(anchor).take(count).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;
    use cc_domain::{CashFlowEntry, EntryType, Task, TaskStatus};
    use chrono::{TimeZone, Utc};

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap())
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn applying_task_recurrence_adds_exactly_one_task() {
        let mut office = Office::new("Recurrence");
        let task = Task::new("Weekly review", clock().0)
            .with_due_date(day(2026, 3, 1))
            .with_recurrence(RecurrenceRule::Weekly);
        let task_id = office.add_task(task);

        let next_id = RecurrenceService::apply_to_task(&mut office, task_id, &clock())
            .expect("apply")
            .expect("next occurrence");

        assert_eq!(office.tasks.len(), 2);
        let original = office.task(task_id).unwrap();
        assert_eq!(original.due_date, Some(day(2026, 3, 1)));
        let next = office.task(next_id).unwrap();
        assert_eq!(next.due_date, Some(day(2026, 3, 8)));
        assert_eq!(next.status, TaskStatus::NotStarted);
        assert_eq!(next.created_at, clock().0);
    }

    #[test]
    fn occurrence_is_continued_only_once() {
        let mut office = Office::new("Recurrence");
        let task_id = office.add_task(
            Task::new("Daily log", clock().0)
                .with_due_date(day(2026, 3, 1))
                .with_recurrence(RecurrenceRule::Daily),
        );
        assert!(RecurrenceService::apply_to_task(&mut office, task_id, &clock())
            .unwrap()
            .is_some());
        assert!(RecurrenceService::apply_to_task(&mut office, task_id, &clock())
            .unwrap()
            .is_none());
        assert_eq!(office.tasks.len(), 2);
    }

    #[test]
    fn non_recurring_task_is_left_alone() {
        let mut office = Office::new("Recurrence");
        let task_id = office.add_task(Task::new("Once", clock().0).with_due_date(day(2026, 3, 1)));
        let result = RecurrenceService::apply_to_task(&mut office, task_id, &clock()).unwrap();
        assert!(result.is_none());
        assert_eq!(office.tasks.len(), 1);
    }

    #[test]
    fn missing_records_are_reported() {
        let mut office = Office::new("Recurrence");
        let missing = Uuid::new_v4();
        assert!(matches!(
            RecurrenceService::apply_to_task(&mut office, missing, &clock()),
            Err(CoreError::TaskNotFound(id)) if id == missing
        ));
        assert!(matches!(
            RecurrenceService::apply_to_cash_flow(&mut office, missing, &clock()),
            Err(CoreError::CashFlowEntryNotFound(id)) if id == missing
        ));
    }

    #[test]
    fn cash_flow_recurrence_uses_month_clamping() {
        let mut office = Office::new("Recurrence");
        let entry =
            CashFlowEntry::new("HOA dues", 350.0, EntryType::Outflow, day(2026, 1, 31), clock().0)
                .with_recurrence(RecurrenceRule::Monthly);
        let entry_id = office.add_cash_flow_entry(entry);

        let next_id = RecurrenceService::apply_to_cash_flow(&mut office, entry_id, &clock())
            .unwrap()
            .unwrap();

        assert_eq!(office.cash_flow_entry(next_id).unwrap().date, day(2026, 2, 28));
        assert_eq!(office.cash_flow_entry(entry_id).unwrap().date, day(2026, 1, 31));
    }

    #[test]
    fn setting_a_rule_requires_a_due_date() {
        let mut office = Office::new("Recurrence");
        let task_id = office.add_task(Task::new("Undated", clock().0));
        let err = RecurrenceService::set_task_rule(
            &mut office,
            task_id,
            RecurrenceRule::Monthly,
            &clock(),
        )
        .expect_err("undated task cannot recur");
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(!RecurrenceService::clear_task_rule(&mut office, task_id, &clock()).unwrap());
    }

    #[test]
    fn preview_lists_upcoming_dates() {
        let dates = RecurrenceService::preview(day(2026, 11, 15), RecurrenceRule::Quarterly, 2);
        assert_eq!(dates, vec![day(2027, 2, 15), day(2027, 5, 15)]);
    }
}
