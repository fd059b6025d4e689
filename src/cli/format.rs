//! Text formatting shared by command handlers.

use chrono::NaiveDate;
use uuid::Uuid;

use cc_domain::{RecurrenceRule, Task};

pub fn format_amount(amount: f64, currency: &str) -> String {
    format!("{amount:.2} {currency}")
}

/// Amount with an explicit `+`/`-` sign, used for net figures.
pub fn format_signed(amount: f64, currency: &str) -> String {
    let sign = if amount < 0.0 { '-' } else { '+' };
    format!("{sign}{:.2} {currency}", amount.abs())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn short_id(id: Uuid) -> String {
    let mut short = id.simple().to_string();
    short.truncate(8);
    short
}

pub fn due_label(task: &Task) -> String {
    match (task.due_date, task.due_time) {
        (Some(date), Some(time)) => format!("{} {}", format_date(date), time.format("%H:%M")),
        (Some(date), None) => format_date(date),
        _ => "-".into(),
    }
}

pub fn rule_label(rule: Option<RecurrenceRule>) -> &'static str {
    rule.map(RecurrenceRule::label).unwrap_or("-")
}
