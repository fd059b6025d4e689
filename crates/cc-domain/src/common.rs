//! Shared traits and date helpers for office records.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::recurrence::{checked_next_occurrence, RecurrenceRule};

/// Exposes a stable identifier for entities stored in an office.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// A dated record that may repeat on a [`RecurrenceRule`].
///
/// Implementors copy themselves forward into a fresh sibling record; the
/// original occurrence is never modified.
pub trait ScheduledItem: Sized {
    /// The date the next occurrence is computed from.
    fn base_date(&self) -> Option<NaiveDate>;

    fn recurrence_rule(&self) -> Option<RecurrenceRule>;

    /// Builds the next sibling record dated `next_date`.
    fn spawn_at(&self, next_date: NaiveDate, now: DateTime<Utc>) -> Self;

    fn is_recurring(&self) -> bool {
        self.recurrence_rule().is_some()
    }

    /// Next occurrence date, or `None` for non-recurring or undated items.
    fn next_occurrence(&self) -> Option<NaiveDate> {
        checked_next_occurrence(self.base_date()?, self.recurrence_rule()?)
    }

    /// Builds the following occurrence, or `None` when the item does not recur.
    fn spawn_next_recurrence(&self, now: DateTime<Utc>) -> Option<Self> {
        let next = self.next_occurrence()?;
        Some(self.spawn_at(next, now))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Half-open reporting window `[start, end)`.
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateWindowError> {
        if end <= start {
            return Err(DateWindowError::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// Window covering `days` days starting at `start`.
    pub fn starting_at(start: NaiveDate, days: u32) -> Result<Self, DateWindowError> {
        let end = start
            .checked_add_days(chrono::Days::new(u64::from(days)))
            .ok_or(DateWindowError::InvalidRange)?;
        Self::new(start, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors that can occur when constructing [`DateWindow`] values.
pub enum DateWindowError {
    InvalidRange,
}

impl fmt::Display for DateWindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateWindowError::InvalidRange => f.write_str("date window end must be after start"),
        }
    }
}

impl std::error::Error for DateWindowError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_half_open() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let window = DateWindow::starting_at(start, 31).unwrap();
        assert!(window.contains(start));
        assert!(window.contains(NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()));
    }

    #[test]
    fn empty_window_is_rejected() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(DateWindow::new(day, day), Err(DateWindowError::InvalidRange));
    }
}
