mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use common::setup_test_env;
use control_center::{
    domain::{EntryType, RecurrenceRule, TaskStatus},
    services::{
        CashFlowDraft, CashFlowService, FixedClock, ScheduleService, TaskDraft, TaskService,
    },
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap())
}

#[test]
fn recurring_task_survives_save_and_reload() {
    let (mut manager, _config) = setup_test_env();
    let clock = clock();
    manager.create("Family Office");

    let office = manager.current_mut().unwrap();
    let mut draft = TaskDraft::new("Quarterly taxes");
    draft.due_date = Some(date(2025, 11, 30));
    draft.is_recurring = true;
    draft.recurrence_rule = Some("quarterly".into());
    let id = TaskService::create(office, draft, &clock).unwrap();
    let spawned = TaskService::set_status(office, id, TaskStatus::Complete, &clock)
        .unwrap()
        .expect("next occurrence");
    manager.save().unwrap();

    manager.load("Family Office").unwrap();
    let office = manager.current().unwrap();
    let next = office.task(spawned).unwrap();
    assert_eq!(next.due_date, Some(date(2026, 2, 28)));
    assert_eq!(next.recurrence, Some(RecurrenceRule::Quarterly));
    assert_eq!(next.recurrence_parent, Some(id));
    assert!(office.task(id).unwrap().completed_at.is_some());
}

#[test]
fn saving_twice_keeps_a_backup_of_the_previous_file() {
    let (mut manager, _config) = setup_test_env();
    manager.create("Studio");
    manager.save().unwrap();
    manager.save().unwrap();

    let backups = manager.list_backups(None).unwrap();
    assert!(!backups.is_empty());
    manager.restore("Studio", "1").unwrap();
    assert_eq!(manager.current().unwrap().name, "Studio");
}

#[test]
fn forecast_projects_recurring_outflows_into_the_window() {
    let (mut manager, _config) = setup_test_env();
    let clock = clock();
    manager.create("Home");
    let office = manager.current_mut().unwrap();

    let mut rent = CashFlowDraft::new("Rent", 1200.0, EntryType::Outflow, date(2026, 1, 15));
    rent.is_recurring = true;
    rent.recurrence_rule = Some("monthly".into());
    CashFlowService::create(office, rent, &clock).unwrap();
    let salary = CashFlowDraft::new("Salary", 3000.0, EntryType::Inflow, date(2026, 3, 1));
    CashFlowService::create(office, salary, &clock).unwrap();

    let window = control_center::domain::DateWindow::new(date(2026, 3, 1), date(2026, 5, 1))
        .unwrap();
    let forecast = CashFlowService::forecast(office, window);
    let projected: Vec<_> = forecast.projected.iter().map(|entry| entry.date).collect();
    assert_eq!(projected, vec![date(2026, 3, 15), date(2026, 4, 15)]);
    assert_eq!(forecast.recorded.inflow, 3000.0);
    assert_eq!(forecast.combined_net(), 3000.0 - 2400.0);
}

#[test]
fn dashboard_flags_overdue_work() {
    let (mut manager, _config) = setup_test_env();
    let clock = clock();
    manager.create("Home");
    let office = manager.current_mut().unwrap();

    let mut late = TaskDraft::new("Renew insurance");
    late.due_date = Some(date(2026, 3, 1));
    let late = TaskService::create(office, late, &clock).unwrap();
    let mut soon = TaskDraft::new("Book plumber");
    soon.due_date = Some(date(2026, 3, 12));
    TaskService::create(office, soon, &clock).unwrap();

    let dashboard = ScheduleService::dashboard(office, clock.0, 14, 30);
    assert_eq!(dashboard.overdue.len(), 1);
    assert_eq!(dashboard.overdue[0].id, late);
    assert_eq!(dashboard.upcoming.len(), 1);
}
