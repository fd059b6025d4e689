//! Form-style input for new records and the validation that guards them.
//!
//! Drafts mirror what a user submits: a recurring checkbox plus free-text
//! rule. Validation turns that into the closed [`RecurrenceRule`] the domain
//! stores, so records with a flag but no rule never reach an office.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use cc_domain::{
    CashFlowEntry, EntryType, RecurrenceRule, Task, TaskDirection, TaskPriority, TaskType,
};

use crate::CoreError;

#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub due_time: Option<NaiveTime>,
    pub priority: TaskPriority,
    pub task_type: TaskType,
    pub direction: TaskDirection,
    pub related_stakeholders: Vec<Uuid>,
    pub related_legal_matter: Option<Uuid>,
    pub related_property: Option<Uuid>,
    pub is_recurring: bool,
    pub recurrence_rule: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Checks the draft and resolves its recurrence rule.
    pub fn validate(&self) -> Result<Option<RecurrenceRule>, CoreError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push("title: This field is required.");
        }
        if self.due_time.is_some() && self.due_date.is_none() {
            errors.push("due_time: A due date is required when setting a time.");
        }
        let raw_rule = non_blank(self.recurrence_rule.as_deref());
        if self.is_recurring && raw_rule.is_none() {
            errors.push("recurrence_rule: Select a recurrence schedule.");
        }
        if self.is_recurring && self.due_date.is_none() {
            errors.push("due_date: A due date is required for recurring tasks.");
        }
        if !errors.is_empty() {
            return Err(CoreError::Validation(errors.join("; ")));
        }
        resolve_rule(self.is_recurring, raw_rule)
    }

    pub fn into_task(self, now: DateTime<Utc>) -> Result<Task, CoreError> {
        let recurrence = self.validate()?;
        let mut task = Task::new(self.title.trim(), now);
        task.description = self.description;
        task.due_date = self.due_date;
        task.due_time = self.due_time;
        task.priority = self.priority;
        task.task_type = self.task_type;
        task.direction = self.direction;
        task.related_stakeholders = self.related_stakeholders;
        task.related_legal_matter = self.related_legal_matter;
        task.related_property = self.related_property;
        task.recurrence = recurrence;
        Ok(task)
    }
}

#[derive(Debug, Clone)]
pub struct CashFlowDraft {
    pub description: String,
    pub amount: f64,
    pub entry_type: EntryType,
    pub category: String,
    pub date: NaiveDate,
    pub is_projected: bool,
    pub is_recurring: bool,
    pub recurrence_rule: Option<String>,
    pub related_stakeholder: Option<Uuid>,
    pub related_property: Option<Uuid>,
    pub related_loan: Option<Uuid>,
    pub related_investment: Option<Uuid>,
    pub notes: String,
}

impl CashFlowDraft {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        entry_type: EntryType,
        date: NaiveDate,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            entry_type,
            category: String::new(),
            date,
            is_projected: false,
            is_recurring: false,
            recurrence_rule: None,
            related_stakeholder: None,
            related_property: None,
            related_loan: None,
            related_investment: None,
            notes: String::new(),
        }
    }

    pub fn validate(&self) -> Result<Option<RecurrenceRule>, CoreError> {
        let mut errors = Vec::new();
        if self.description.trim().is_empty() {
            errors.push("description: This field is required.");
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            errors.push("amount: Enter a non-negative amount.");
        }
        let raw_rule = non_blank(self.recurrence_rule.as_deref());
        if self.is_recurring && raw_rule.is_none() {
            errors.push("recurrence_rule: Select a recurrence schedule.");
        }
        if !errors.is_empty() {
            return Err(CoreError::Validation(errors.join("; ")));
        }
        resolve_rule(self.is_recurring, raw_rule)
    }

    pub fn into_entry(self, now: DateTime<Utc>) -> Result<CashFlowEntry, CoreError> {
        let recurrence = self.validate()?;
        let mut entry = CashFlowEntry::new(
            self.description.trim(),
            self.amount,
            self.entry_type,
            self.date,
            now,
        );
        entry.category = self.category;
        entry.is_projected = self.is_projected;
        entry.recurrence = recurrence;
        entry.related_stakeholder = self.related_stakeholder;
        entry.related_property = self.related_property;
        entry.related_loan = self.related_loan;
        entry.related_investment = self.related_investment;
        entry.notes = self.notes;
        Ok(entry)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// A rule without the recurring flag is dropped rather than stored.
fn resolve_rule(
    is_recurring: bool,
    raw_rule: Option<&str>,
) -> Result<Option<RecurrenceRule>, CoreError> {
    match (is_recurring, raw_rule) {
        (true, Some(raw)) => Ok(Some(raw.parse::<RecurrenceRule>()?)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_domain::ConfigurationError;

    fn due() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn recurring_task_requires_rule_and_date() {
        let mut draft = TaskDraft::new("Bad Recurring");
        draft.is_recurring = true;

        let err = draft.validate().expect_err("missing rule and date");
        let message = err.to_string();
        assert!(message.contains("Select a recurrence schedule."), "{message}");
        assert!(message.contains("A due date is required for recurring tasks."), "{message}");
    }

    #[test]
    fn due_time_requires_due_date() {
        let mut draft = TaskDraft::new("Call bank");
        draft.due_time = NaiveTime::from_hms_opt(10, 0, 0);
        let err = draft.validate().expect_err("time without date");
        assert!(matches!(err, CoreError::Validation(ref msg) if msg.contains("due_time")));
    }

    #[test]
    fn unrecognized_rule_is_a_configuration_error() {
        let mut draft = TaskDraft::new("Pay invoice");
        draft.due_date = Some(due());
        draft.is_recurring = true;
        draft.recurrence_rule = Some("hourly".into());

        let err = draft.validate().expect_err("unknown rule");
        assert!(matches!(
            err,
            CoreError::Configuration(ConfigurationError::Unrecognized(ref raw)) if raw == "hourly"
        ));
    }

    #[test]
    fn rule_without_flag_is_ignored() {
        let mut draft = TaskDraft::new("Water plants");
        draft.due_date = Some(due());
        draft.recurrence_rule = Some("weekly".into());
        let task = draft.into_task(Utc::now()).expect("valid draft");
        assert_eq!(task.recurrence, None);
    }

    #[test]
    fn valid_recurring_cash_flow_draft_builds_entry() {
        let mut draft = CashFlowDraft::new("Mortgage", 1800.0, EntryType::Outflow, due());
        draft.is_recurring = true;
        draft.recurrence_rule = Some("Monthly".into());
        let entry = draft.into_entry(Utc::now()).expect("valid draft");
        assert_eq!(entry.recurrence, Some(RecurrenceRule::Monthly));
        assert_eq!(entry.amount, 1800.0);
    }

    #[test]
    fn negative_cash_flow_amount_is_rejected() {
        let draft = CashFlowDraft::new("Refund", -5.0, EntryType::Inflow, due());
        assert!(matches!(draft.validate(), Err(CoreError::Validation(_))));
    }
}
