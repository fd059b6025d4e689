//! The office aggregate: one persisted file holding tasks and cash flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{cash_flow::CashFlowEntry, task::Task};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Office {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub cash_flow: Vec<CashFlowEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Office::schema_version_default")]
    pub schema_version: u8,
}

impl Office {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            tasks: Vec::new(),
            cash_flow: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn add_task(&mut self, task: Task) -> Uuid {
        let id = task.id;
        self.tasks.push(task);
        self.touch();
        id
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    pub fn remove_task(&mut self, id: Uuid) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id == id)?;
        let removed = self.tasks.remove(index);
        self.touch();
        Some(removed)
    }

    pub fn add_cash_flow_entry(&mut self, entry: CashFlowEntry) -> Uuid {
        let id = entry.id;
        self.cash_flow.push(entry);
        self.touch();
        id
    }

    pub fn cash_flow_entry(&self, id: Uuid) -> Option<&CashFlowEntry> {
        self.cash_flow.iter().find(|entry| entry.id == id)
    }

    pub fn cash_flow_entry_mut(&mut self, id: Uuid) -> Option<&mut CashFlowEntry> {
        self.cash_flow.iter_mut().find(|entry| entry.id == id)
    }

    pub fn remove_cash_flow_entry(&mut self, id: Uuid) -> Option<CashFlowEntry> {
        let index = self.cash_flow.iter().position(|entry| entry.id == id)?;
        let removed = self.cash_flow.remove(index);
        self.touch();
        Some(removed)
    }

    /// Resolves a full id or a unique id prefix (as printed by short listings).
    pub fn find_task_id(&self, needle: &str) -> Option<Uuid> {
        find_by_prefix(self.tasks.iter().map(|task| task.id), needle)
    }

    pub fn find_cash_flow_id(&self, needle: &str) -> Option<Uuid> {
        find_by_prefix(self.cash_flow.iter().map(|entry| entry.id), needle)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}

fn find_by_prefix(ids: impl Iterator<Item = Uuid>, needle: &str) -> Option<Uuid> {
    let needle = needle.trim().to_ascii_lowercase().replace('-', "");
    if needle.is_empty() {
        return None;
    }
    let mut matches = ids.filter(|id| id.simple().to_string().starts_with(&needle));
    let first = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_unique_prefix() {
        let mut office = Office::new("Family");
        let id = office.add_task(Task::new("File taxes", Utc::now()));
        let prefix = &id.simple().to_string()[..8];
        assert_eq!(office.find_task_id(prefix), Some(id));
        assert_eq!(office.find_task_id(&id.to_string()), Some(id));
        assert_eq!(office.find_task_id(""), None);
    }

    #[test]
    fn remove_task_returns_removed_value() {
        let mut office = Office::new("Family");
        let id = office.add_task(Task::new("Renew lease", Utc::now()));
        let removed = office.remove_task(id).expect("task removed");
        assert_eq!(removed.title, "Renew lease");
        assert!(office.tasks.is_empty());
        assert!(office.remove_task(id).is_none());
    }
}
