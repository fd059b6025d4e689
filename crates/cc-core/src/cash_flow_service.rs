//! Cash-flow bookkeeping and window projections.

use std::collections::HashSet;

use chrono::NaiveDate;
use uuid::Uuid;

use cc_domain::{CashFlowEntry, DateWindow, EntryType, Office, RecurrenceRule};

use crate::{
    draft::CashFlowDraft, recurrence_service::RecurrenceService, time::Clock, CoreError,
};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CashFlowTotals {
    pub count: usize,
    pub inflow: f64,
    pub outflow: f64,
    pub net: f64,
}

impl CashFlowTotals {
    pub(crate) fn record(&mut self, entry_type: EntryType, amount: f64) {
        self.count += 1;
        match entry_type {
            EntryType::Inflow => self.inflow += amount,
            EntryType::Outflow => self.outflow += amount,
        }
        self.net = self.inflow - self.outflow;
    }
}

/// A future occurrence computed for reporting only.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedEntry {
    /// The recorded entry the projection continues from.
    pub source_id: Uuid,
    pub description: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub entry_type: EntryType,
    pub rule: RecurrenceRule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowForecast {
    pub window: DateWindow,
    pub recorded: CashFlowTotals,
    pub projected: Vec<ProjectedEntry>,
    pub projected_totals: CashFlowTotals,
}

impl CashFlowForecast {
    /// Net of recorded and projected amounts together.
    pub fn combined_net(&self) -> f64 {
        self.recorded.net + self.projected_totals.net
    }
}

pub struct CashFlowService;

impl CashFlowService {
    pub fn add(office: &mut Office, entry: CashFlowEntry) -> Result<Uuid, CoreError> {
        if entry.description.trim().is_empty() {
            return Err(CoreError::Validation(
                "description: This field is required.".into(),
            ));
        }
        if !entry.amount.is_finite() || entry.amount < 0.0 {
            return Err(CoreError::Validation(
                "amount: Enter a non-negative amount.".into(),
            ));
        }
        Ok(office.add_cash_flow_entry(entry))
    }

    pub fn create(
        office: &mut Office,
        draft: CashFlowDraft,
        clock: &dyn Clock,
    ) -> Result<Uuid, CoreError> {
        let entry = draft.into_entry(clock.now())?;
        Self::add(office, entry)
    }

    pub fn remove(office: &mut Office, id: Uuid) -> Result<CashFlowEntry, CoreError> {
        office
            .remove_cash_flow_entry(id)
            .ok_or(CoreError::CashFlowEntryNotFound(id))
    }

    /// Entries ordered by date, oldest first.
    pub fn list(office: &Office) -> Vec<&CashFlowEntry> {
        let mut entries: Vec<&CashFlowEntry> = office.cash_flow.iter().collect();
        entries.sort_by_key(|entry| entry.date);
        entries
    }

    /// Records the next occurrence of a recurring entry.
    ///
    /// Only the newest entry of a chain may be continued, so a chain never
    /// forks into duplicate dates.
    pub fn record_next_occurrence(
        office: &mut Office,
        id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Uuid, CoreError> {
        let entry = office
            .cash_flow_entry(id)
            .ok_or(CoreError::CashFlowEntryNotFound(id))?;
        if entry.recurrence.is_none() {
            return Err(CoreError::InvalidOperation(format!(
                "cash flow entry '{}' does not recur",
                entry.description
            )));
        }
        if office
            .cash_flow
            .iter()
            .any(|other| other.recurrence_parent == Some(id))
        {
            return Err(CoreError::InvalidOperation(format!(
                "cash flow entry '{}' already has a next occurrence",
                entry.description
            )));
        }
        RecurrenceService::apply_to_cash_flow(office, id, clock)?.ok_or_else(|| {
            CoreError::InvalidOperation("cash flow entry has no further occurrence".into())
        })
    }

    /// Totals of recorded entries dated inside `window`.
    pub fn summarize(office: &Office, window: DateWindow) -> CashFlowTotals {
        let mut totals = CashFlowTotals::default();
        for entry in office.cash_flow.iter().filter(|e| window.contains(e.date)) {
            totals.record(entry.entry_type, entry.amount);
        }
        totals
    }

    /// Recorded totals plus the occurrences each recurring chain would add
    /// inside `window`. Nothing is written back to the office.
    pub fn forecast(office: &Office, window: DateWindow) -> CashFlowForecast {
        let mut projected = Vec::new();
        for tip in chain_tips(office) {
            let Some(rule) = tip.recurrence else {
                continue;
            };
            let dates = rule
                .occurrences_after(tip.date)
                .skip_while(|date| *date < window.start)
                .take_while(|date| *date < window.end);
            projected.extend(dates.map(|date| ProjectedEntry {
                source_id: tip.id,
                description: tip.description.clone(),
                date,
                amount: tip.amount,
                entry_type: tip.entry_type,
                rule,
            }));
        }
        projected.sort_by(|a, b| a.date.cmp(&b.date).then(a.description.cmp(&b.description)));

        let mut projected_totals = CashFlowTotals::default();
        for item in &projected {
            projected_totals.record(item.entry_type, item.amount);
        }
        tracing::debug!(
            projected = projected.len(),
            start = %window.start,
            end = %window.end,
            "cash flow forecast computed"
        );
        CashFlowForecast {
            window,
            recorded: Self::summarize(office, window),
            projected,
            projected_totals,
        }
    }
}

/// Recurring entries that no other entry continues.
fn chain_tips(office: &Office) -> impl Iterator<Item = &CashFlowEntry> {
    let parents: HashSet<Uuid> = office
        .cash_flow
        .iter()
        .filter_map(|entry| entry.recurrence_parent)
        .collect();
    office
        .cash_flow
        .iter()
        .filter(move |entry| entry.recurrence.is_some() && !parents.contains(&entry.id))
}
