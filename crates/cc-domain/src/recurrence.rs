//! Recurrence rules and the calendar arithmetic that advances scheduled items.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// The period by which a scheduled item repeats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceRule {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl RecurrenceRule {
    pub const ALL: [RecurrenceRule; 6] = [
        RecurrenceRule::Daily,
        RecurrenceRule::Weekly,
        RecurrenceRule::Biweekly,
        RecurrenceRule::Monthly,
        RecurrenceRule::Quarterly,
        RecurrenceRule::Yearly,
    ];

    /// Stable lowercase identifier used in persisted data and command input.
    pub fn as_str(self) -> &'static str {
        match self {
            RecurrenceRule::Daily => "daily",
            RecurrenceRule::Weekly => "weekly",
            RecurrenceRule::Biweekly => "biweekly",
            RecurrenceRule::Monthly => "monthly",
            RecurrenceRule::Quarterly => "quarterly",
            RecurrenceRule::Yearly => "yearly",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            RecurrenceRule::Daily => "Daily",
            RecurrenceRule::Weekly => "Weekly",
            RecurrenceRule::Biweekly => "Every 2 Weeks",
            RecurrenceRule::Monthly => "Monthly",
            RecurrenceRule::Quarterly => "Quarterly",
            RecurrenceRule::Yearly => "Yearly",
        }
    }

    /// Shorthand for [`next_occurrence`].
    pub fn next_after(self, date: NaiveDate) -> NaiveDate {
        next_occurrence(date, self)
    }

    /// Iterates the chain of occurrences that follow `anchor`.
    pub fn occurrences_after(self, anchor: NaiveDate) -> Occurrences {
        Occurrences::new(anchor, self)
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RecurrenceRule {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(ConfigurationError::Unset);
        }
        RecurrenceRule::ALL
            .into_iter()
            .find(|rule| rule.as_str() == normalized)
            .ok_or_else(|| ConfigurationError::Unrecognized(value.trim().to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Raised when a recurrence rule is missing or cannot be understood.
pub enum ConfigurationError {
    Unset,
    Unrecognized(String),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::Unset => f.write_str("recurrence rule is not set"),
            ConfigurationError::Unrecognized(value) => write!(
                f,
                "unrecognized recurrence rule `{}` (expected daily, weekly, biweekly, monthly, quarterly or yearly)",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Computes the occurrence that follows `base_date` under `rule`.
///
/// Month-based rules clamp the day to the last valid day of the target month,
/// and a yearly rule anchored on the last day of February lands on the last
/// day of February of the following year. Dates at the very end of the
/// representable range saturate at [`NaiveDate::MAX`].
pub fn next_occurrence(base_date: NaiveDate, rule: RecurrenceRule) -> NaiveDate {
    checked_next_occurrence(base_date, rule).unwrap_or(NaiveDate::MAX)
}

/// Like [`next_occurrence`] but returns `None` when the result would fall
/// outside the representable date range.
pub fn checked_next_occurrence(base_date: NaiveDate, rule: RecurrenceRule) -> Option<NaiveDate> {
    match rule {
        RecurrenceRule::Daily => base_date.checked_add_days(Days::new(1)),
        RecurrenceRule::Weekly => base_date.checked_add_days(Days::new(7)),
        RecurrenceRule::Biweekly => base_date.checked_add_days(Days::new(14)),
        RecurrenceRule::Monthly => shift_months(base_date, 1),
        RecurrenceRule::Quarterly => shift_months(base_date, 3),
        RecurrenceRule::Yearly => shift_year(base_date),
    }
}

/// Number of days in `month` (1-12) of `year`.
pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn shift_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let index = date.month0() + months;
    let year = date.year().checked_add((index / 12) as i32)?;
    let month = index % 12 + 1;
    let day = date.day().min(last_day_of_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

fn shift_year(date: NaiveDate) -> Option<NaiveDate> {
    let year = date.year().checked_add(1)?;
    if date.month() == 2 && date.day() == last_day_of_month(date.year(), 2) {
        return NaiveDate::from_ymd_opt(year, 2, last_day_of_month(year, 2));
    }
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
}

/// Iterator over successive occurrences, each derived from the previous one.
#[derive(Debug, Clone)]
pub struct Occurrences {
    next: Option<NaiveDate>,
    rule: RecurrenceRule,
}

impl Occurrences {
    pub fn new(anchor: NaiveDate, rule: RecurrenceRule) -> Self {
        Self {
            next: checked_next_occurrence(anchor, rule),
            rule,
        }
    }
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = checked_next_occurrence(current, self.rule);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fixed_day_rules_add_whole_days() {
        let start = date(2026, 3, 1);
        assert_eq!(next_occurrence(start, RecurrenceRule::Daily), date(2026, 3, 2));
        assert_eq!(next_occurrence(start, RecurrenceRule::Weekly), date(2026, 3, 8));
        assert_eq!(
            next_occurrence(start, RecurrenceRule::Biweekly),
            date(2026, 3, 15)
        );
        assert_eq!(
            next_occurrence(date(2026, 12, 31), RecurrenceRule::Daily),
            date(2027, 1, 1)
        );
    }

    #[test]
    fn monthly_clamps_to_end_of_month() {
        assert_eq!(
            next_occurrence(date(2026, 1, 31), RecurrenceRule::Monthly),
            date(2026, 2, 28)
        );
        assert_eq!(
            next_occurrence(date(2028, 1, 31), RecurrenceRule::Monthly),
            date(2028, 2, 29)
        );
        assert_eq!(
            next_occurrence(date(2026, 12, 15), RecurrenceRule::Monthly),
            date(2027, 1, 15)
        );
    }

    #[test]
    fn quarterly_rolls_year_and_clamps() {
        assert_eq!(
            next_occurrence(date(2026, 1, 31), RecurrenceRule::Quarterly),
            date(2026, 4, 30)
        );
        assert_eq!(
            next_occurrence(date(2026, 11, 15), RecurrenceRule::Quarterly),
            date(2027, 2, 15)
        );
        assert_eq!(
            next_occurrence(date(2026, 11, 30), RecurrenceRule::Quarterly),
            date(2027, 2, 28)
        );
    }

    #[test]
    fn yearly_tracks_end_of_february() {
        assert_eq!(
            next_occurrence(date(2024, 2, 29), RecurrenceRule::Yearly),
            date(2025, 2, 28)
        );
        assert_eq!(
            next_occurrence(date(2027, 2, 28), RecurrenceRule::Yearly),
            date(2028, 2, 29)
        );
        assert_eq!(
            next_occurrence(date(2028, 2, 28), RecurrenceRule::Yearly),
            date(2029, 2, 28)
        );
        assert_eq!(
            next_occurrence(date(2026, 7, 4), RecurrenceRule::Yearly),
            date(2027, 7, 4)
        );
    }

    #[test]
    fn last_day_of_month_handles_century_leap_rules() {
        assert_eq!(last_day_of_month(1900, 2), 28);
        assert_eq!(last_day_of_month(2000, 2), 29);
        assert_eq!(last_day_of_month(2026, 4), 30);
        assert_eq!(last_day_of_month(2026, 12), 31);
    }

    #[test]
    fn parses_rule_names_case_insensitively() {
        assert_eq!(" Monthly ".parse::<RecurrenceRule>(), Ok(RecurrenceRule::Monthly));
        assert_eq!("BIWEEKLY".parse::<RecurrenceRule>(), Ok(RecurrenceRule::Biweekly));
        assert_eq!("".parse::<RecurrenceRule>(), Err(ConfigurationError::Unset));
        assert_eq!(
            "fortnightly".parse::<RecurrenceRule>(),
            Err(ConfigurationError::Unrecognized("fortnightly".into()))
        );
    }

    #[test]
    fn saturates_at_the_end_of_the_calendar() {
        assert_eq!(checked_next_occurrence(NaiveDate::MAX, RecurrenceRule::Daily), None);
        assert_eq!(
            next_occurrence(NaiveDate::MAX, RecurrenceRule::Monthly),
            NaiveDate::MAX
        );
    }

    #[test]
    fn occurrences_iterate_from_previous_result() {
        let dates: Vec<_> = RecurrenceRule::Monthly
            .occurrences_after(date(2026, 1, 31))
            .take(3)
            .collect();
        assert_eq!(dates, vec![date(2026, 2, 28), date(2026, 3, 28), date(2026, 4, 28)]);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&RecurrenceRule::Quarterly).unwrap();
        assert_eq!(json, "\"quarterly\"");
        let rule: RecurrenceRule = serde_json::from_str("\"biweekly\"").unwrap();
        assert_eq!(rule, RecurrenceRule::Biweekly);
    }
}
