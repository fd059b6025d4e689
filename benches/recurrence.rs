use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use control_center::domain::{next_occurrence, DateWindow, EntryType, Office, RecurrenceRule};
use control_center::services::{CashFlowDraft, CashFlowService, FixedClock, RecurrenceService};

fn bench_next_occurrence(c: &mut Criterion) {
    let anchor = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    c.bench_function("next_occurrence_monthly", |b| {
        b.iter(|| next_occurrence(black_box(anchor), black_box(RecurrenceRule::Monthly)))
    });
    c.bench_function("preview_daily_365", |b| {
        b.iter(|| RecurrenceService::preview(black_box(anchor), RecurrenceRule::Daily, 365))
    });
}

fn bench_forecast(c: &mut Criterion) {
    let clock = FixedClock(chrono::Utc::now());
    let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let mut office = Office::new("Bench");
    for idx in 0..200u32 {
        let mut draft = CashFlowDraft::new(
            format!("Entry {idx}"),
            f64::from(idx) + 10.0,
            if idx % 2 == 0 { EntryType::Inflow } else { EntryType::Outflow },
            start,
        );
        draft.is_recurring = true;
        draft.recurrence_rule = Some(RecurrenceRule::ALL[(idx % 6) as usize].as_str().into());
        if CashFlowService::create(&mut office, draft, &clock).is_err() {
            return;
        }
    }
    let Ok(window) = DateWindow::starting_at(start, 365) else {
        return;
    };
    c.bench_function("forecast_one_year", |b| {
        b.iter(|| CashFlowService::forecast(black_box(&office), black_box(window)))
    });
}

criterion_group!(benches, bench_next_occurrence, bench_forecast);
criterion_main!(benches);
