use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use cc_domain::{Office, ScheduledItem};

use crate::CoreError;

/// Describes a persisted backup artifact for an office.
#[derive(Debug, Clone)]
pub struct OfficeBackupInfo {
    pub office: String,
    pub id: String,
    pub created_at: String,
    pub path: PathBuf,
}

/// Abstraction over persistence backends capable of storing offices and backups.
pub trait OfficeStorage: Send + Sync {
    fn save_office(&self, name: &str, office: &Office) -> Result<(), CoreError>;
    fn load_office(&self, name: &str) -> Result<Office, CoreError>;
    fn list_offices(&self) -> Result<Vec<String>, CoreError>;
    fn delete_office(&self, name: &str) -> Result<(), CoreError>;
    fn save_office_to_path(&self, office: &Office, path: &Path) -> Result<(), CoreError>;
    fn load_office_from_path(&self, path: &Path) -> Result<Office, CoreError>;
    fn backup_office(
        &self,
        name: &str,
        office: &Office,
        note: Option<&str>,
    ) -> Result<OfficeBackupInfo, CoreError>;
    fn list_backups(&self, name: &str) -> Result<Vec<OfficeBackupInfo>, CoreError>;
    fn restore_backup(&self, backup: &OfficeBackupInfo) -> Result<Office, CoreError>;
}

/// Detects broken recurrence chains and other anomalies within an office snapshot.
///
/// A parent that no longer exists is fine (old occurrences may be deleted), but
/// two records continuing the same parent means the chain has forked.
pub fn office_warnings(office: &Office) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut task_parents = HashSet::new();
    let mut entry_parents = HashSet::new();

    for task in &office.tasks {
        if task.is_recurring() && task.due_date.is_none() {
            warnings.push(format!(
                "task {} recurs {} but has no due date",
                task.id,
                task.recurrence.map(|rule| rule.as_str()).unwrap_or_default()
            ));
        }
        if task.due_time.is_some() && task.due_date.is_none() {
            warnings.push(format!("task {} has a due time without a due date", task.id));
        }
        if let Some(parent) = task.recurrence_parent {
            if !task_parents.insert(parent) {
                warnings.push(format!(
                    "task occurrence {} is continued more than once",
                    parent
                ));
            }
        }
    }
    for entry in &office.cash_flow {
        if !entry.amount.is_finite() || entry.amount < 0.0 {
            warnings.push(format!(
                "cash flow entry {} has invalid amount {}",
                entry.id, entry.amount
            ));
        }
        if let Some(parent) = entry.recurrence_parent {
            if !entry_parents.insert(parent) {
                warnings.push(format!(
                    "cash flow occurrence {} is continued more than once",
                    parent
                ));
            }
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_domain::{CashFlowEntry, EntryType, RecurrenceRule, Task};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    #[test]
    fn clean_office_has_no_warnings() {
        let mut office = Office::new("Clean");
        office.add_task(
            Task::new("Weekly", Utc::now())
                .with_due_date(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
                .with_recurrence(RecurrenceRule::Weekly),
        );
        assert!(office_warnings(&office).is_empty());
    }

    #[test]
    fn hand_edited_records_are_flagged() {
        let mut office = Office::new("Edited");
        office.tasks.push(Task::new("Broken", Utc::now()).with_recurrence(RecurrenceRule::Daily));
        let parent = Uuid::new_v4();
        for _ in 0..2 {
            let mut fork = CashFlowEntry::new(
                "Fork",
                10.0,
                EntryType::Inflow,
                NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                Utc::now(),
            );
            fork.recurrence_parent = Some(parent);
            office.cash_flow.push(fork);
        }

        let warnings = office_warnings(&office);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("recurs daily but has no due date"));
        assert!(warnings[1].contains("is continued more than once"));
    }
}
