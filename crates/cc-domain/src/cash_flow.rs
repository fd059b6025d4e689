//! Cash-flow entries: dated inflows and outflows tied to office assets.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::{Displayable, Identifiable, ScheduledItem},
    recurrence::RecurrenceRule,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowEntry {
    pub id: Uuid,
    pub description: String,
    /// Unsigned amount; the direction comes from `entry_type`.
    pub amount: f64,
    pub entry_type: EntryType,
    #[serde(default)]
    pub category: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub is_projected: bool,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_parent: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_stakeholder: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_property: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_loan: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_investment: Option<Uuid>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl CashFlowEntry {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        entry_type: EntryType,
        date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
            entry_type,
            category: String::new(),
            date,
            is_projected: false,
            recurrence: None,
            recurrence_parent: None,
            related_stakeholder: None,
            related_property: None,
            related_loan: None,
            related_investment: None,
            notes: String::new(),
            created_at,
        }
    }

    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = Some(rule);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Positive for inflows, negative for outflows.
    pub fn signed_amount(&self) -> f64 {
        match self.entry_type {
            EntryType::Inflow => self.amount,
            EntryType::Outflow => -self.amount,
        }
    }

    pub fn next_date(&self) -> Option<NaiveDate> {
        self.next_occurrence()
    }
}

impl ScheduledItem for CashFlowEntry {
    fn base_date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }

    fn recurrence_rule(&self) -> Option<RecurrenceRule> {
        self.recurrence
    }

    fn spawn_at(&self, next_date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: next_date,
            recurrence_parent: Some(self.id),
            created_at: now,
            ..self.clone()
        }
    }
}

impl Identifiable for CashFlowEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for CashFlowEntry {
    fn display_label(&self) -> String {
        format!("{} ({}: ${:.2})", self.description, self.entry_type, self.amount)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Inflow,
    Outflow,
}

impl EntryType {
    pub fn from_key(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inflow" | "in" => Some(EntryType::Inflow),
            "outflow" | "out" => Some(EntryType::Outflow),
            _ => None,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryType::Inflow => "inflow",
            EntryType::Outflow => "outflow",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 8, 0, 0).unwrap()
    }

    #[test]
    fn creation_time_is_the_one_supplied() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let entry = CashFlowEntry::new("Deposit", 100.0, EntryType::Inflow, date, created());
        assert_eq!(entry.created_at, created());
    }

    #[test]
    fn spawned_entry_keeps_amount_and_links() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let mut rent =
            CashFlowEntry::new("Rent - Elm St", 2400.0, EntryType::Inflow, date, created())
            .with_recurrence(RecurrenceRule::Monthly)
            .with_category("rent");
        rent.related_property = Some(Uuid::new_v4());
        rent.is_projected = true;
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap();

        let next = rent.spawn_next_recurrence(now).expect("monthly entry spawns");

        assert_eq!(next.date, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(next.amount, 2400.0);
        assert_eq!(next.category, "rent");
        assert_eq!(next.related_property, rent.related_property);
        assert!(next.is_projected);
        assert_eq!(next.recurrence_parent, Some(rent.id));
        assert_eq!(next.created_at, now);
        assert_eq!(rent.date, date);
    }

    #[test]
    fn quarterly_entries_use_calendar_months() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let entry =
            CashFlowEntry::new("Estimated tax", 5000.0, EntryType::Outflow, date, created())
            .with_recurrence(RecurrenceRule::Quarterly);
        assert_eq!(entry.next_date(), NaiveDate::from_ymd_opt(2026, 4, 15));
        assert_eq!(entry.signed_amount(), -5000.0);
    }
}
