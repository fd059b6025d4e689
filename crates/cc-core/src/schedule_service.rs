//! Date-driven views over an office: what is late, what is coming, who owes a reply.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use uuid::Uuid;

use cc_domain::{Office, Task};

use crate::cash_flow_service::CashFlowTotals;

pub const UPCOMING_WINDOW_DAYS: u32 = 14;
pub const DEADLINE_HORIZON_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineKind {
    Task,
    Meeting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deadline {
    pub date: NaiveDate,
    pub kind: DeadlineKind,
    pub title: String,
    pub task_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleFollowUp {
    pub task_id: Uuid,
    pub task_title: String,
    pub follow_up_id: Uuid,
    pub method: String,
    pub outreach_at: DateTime<Utc>,
    pub days_waiting: i64,
}

/// Everything the dashboard shows for one day.
#[derive(Debug, Clone)]
pub struct Dashboard<'a> {
    pub today: NaiveDate,
    pub overdue: Vec<&'a Task>,
    pub upcoming: Vec<&'a Task>,
    pub meetings: Vec<&'a Task>,
    pub deadlines: Vec<Deadline>,
    pub stale_follow_ups: Vec<StaleFollowUp>,
    /// Actual (non-projected) cash flow dated in the current month.
    pub month_cash_flow: CashFlowTotals,
}

pub struct ScheduleService;

impl ScheduleService {
    /// Open tasks due before `today`, oldest first.
    pub fn overdue(office: &Office, today: NaiveDate) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = open_tasks(office)
            .filter(|task| task.due_date.is_some_and(|due| due < today))
            .collect();
        tasks.sort_by_key(|task| task.due_date);
        tasks
    }

    /// Open tasks due from `today` through `today + days`, inclusive.
    pub fn upcoming(office: &Office, today: NaiveDate, days: u32) -> Vec<&Task> {
        let until = add_days(today, days);
        let mut tasks: Vec<&Task> = open_tasks(office)
            .filter(|task| task.due_date.is_some_and(|due| due >= today && due <= until))
            .collect();
        tasks.sort_by_key(|task| (task.due_date, task.due_time));
        tasks
    }

    /// Open meetings in the upcoming window, ordered by date and time.
    pub fn meetings(office: &Office, today: NaiveDate, days: u32) -> Vec<&Task> {
        Self::upcoming(office, today, days)
            .into_iter()
            .filter(|task| task.is_meeting())
            .collect()
    }

    /// Open tasks and meetings due within the horizon as one date-sorted list.
    pub fn deadlines(office: &Office, today: NaiveDate, horizon_days: u32) -> Vec<Deadline> {
        let mut deadlines: Vec<Deadline> = Self::upcoming(office, today, horizon_days)
            .into_iter()
            .filter_map(|task| {
                let date = task.due_date?;
                let (kind, title) = if task.is_meeting() {
                    let title = match task.due_time {
                        Some(time) => format!("{} at {}", task.title, time.format("%-I:%M %p")),
                        None => task.title.clone(),
                    };
                    (DeadlineKind::Meeting, title)
                } else {
                    (DeadlineKind::Task, task.title.clone())
                };
                Some(Deadline {
                    date,
                    kind,
                    title,
                    task_id: task.id,
                })
            })
            .collect();
        deadlines.sort_by_key(|deadline| deadline.date);
        deadlines
    }

    /// Unanswered outreach past its follow-up window on tasks still open.
    pub fn stale_follow_ups(office: &Office, now: DateTime<Utc>) -> Vec<StaleFollowUp> {
        let mut stale: Vec<StaleFollowUp> = open_tasks(office)
            .flat_map(|task| {
                task.follow_ups
                    .iter()
                    .filter(move |follow_up| {
                        !follow_up.response_received && now > follow_up.reminder_due_at()
                    })
                    .map(move |follow_up| StaleFollowUp {
                        task_id: task.id,
                        task_title: task.title.clone(),
                        follow_up_id: follow_up.id,
                        method: follow_up.method.clone(),
                        outreach_at: follow_up.outreach_at,
                        days_waiting: (now - follow_up.outreach_at).num_days(),
                    })
            })
            .collect();
        stale.sort_by_key(|item| item.outreach_at);
        stale
    }

    /// Builds the whole dashboard for the day `now` falls on.
    pub fn dashboard(
        office: &Office,
        now: DateTime<Utc>,
        upcoming_days: u32,
        horizon_days: u32,
    ) -> Dashboard<'_> {
        let today = now.date_naive();
        let mut month_cash_flow = CashFlowTotals::default();
        for entry in office.cash_flow.iter().filter(|entry| {
            !entry.is_projected
                && entry.date.year() == today.year()
                && entry.date.month() == today.month()
        }) {
            month_cash_flow.record(entry.entry_type, entry.amount);
        }
        Dashboard {
            today,
            overdue: Self::overdue(office, today),
            upcoming: Self::upcoming(office, today, upcoming_days),
            meetings: Self::meetings(office, today, upcoming_days),
            deadlines: Self::deadlines(office, today, horizon_days),
            stale_follow_ups: Self::stale_follow_ups(office, now),
            month_cash_flow,
        }
    }
}

fn open_tasks(office: &Office) -> impl Iterator<Item = &Task> {
    office.tasks.iter().filter(|task| !task.is_complete())
}

fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_domain::{CashFlowEntry, EntryType, FollowUp, TaskStatus, TaskType};
    use chrono::{Duration, NaiveTime, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn office() -> Office {
        let mut office = Office::new("Schedule");
        office.add_task(Task::new("Late filing", now()).with_due_date(day(2026, 3, 9)));
        office.add_task(Task::new("Due today", now()).with_due_date(day(2026, 3, 10)));
        office.add_task(Task::new("Window edge", now()).with_due_date(day(2026, 3, 24)));
        office.add_task(Task::new("Next month", now()).with_due_date(day(2026, 4, 5)));
        let mut done = Task::new("Done already", now()).with_due_date(day(2026, 3, 1));
        done.set_status(TaskStatus::Complete, now());
        office.add_task(done);
        let mut meeting = Task::new("Lawyer call", now())
            .with_due_date(day(2026, 3, 12))
            .with_type(TaskType::Meeting);
        meeting.due_time = NaiveTime::from_hms_opt(9, 30, 0);
        office.add_task(meeting);
        office
    }

    #[test]
    fn overdue_excludes_complete_and_today() {
        let office = office();
        let titles: Vec<_> = ScheduleService::overdue(&office, now().date_naive())
            .iter()
            .map(|task| task.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Late filing"]);
    }

    #[test]
    fn upcoming_window_is_inclusive() {
        let office = office();
        let titles: Vec<_> = ScheduleService::upcoming(&office, now().date_naive(), 14)
            .iter()
            .map(|task| task.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Due today", "Lawyer call", "Window edge"]);
    }

    #[test]
    fn deadlines_label_meetings_with_time() {
        let office = office();
        let deadlines = ScheduleService::deadlines(&office, now().date_naive(), 30);
        assert_eq!(deadlines.len(), 4);
        let meeting = deadlines
            .iter()
            .find(|deadline| deadline.kind == DeadlineKind::Meeting)
            .expect("meeting deadline");
        assert_eq!(meeting.title, "Lawyer call at 9:30 AM");
        assert!(deadlines.windows(2).all(|pair| pair[0].date <= pair[1].date));
    }

    #[test]
    fn stale_follow_ups_need_elapsed_window_and_no_reply() {
        let mut office = office();
        let mut waiting = Task::new("Get appraisal", now());
        waiting.follow_ups.push(FollowUp::new(now() - Duration::days(5), "email"));
        waiting.follow_ups.push(FollowUp::new(now() - Duration::days(1), "phone"));
        let mut answered = FollowUp::new(now() - Duration::days(9), "letter");
        answered.record_response(now(), "Received");
        waiting.follow_ups.push(answered);
        office.add_task(waiting);

        let stale = ScheduleService::stale_follow_ups(&office, now());
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].method, "email");
        assert_eq!(stale[0].days_waiting, 5);
    }

    #[test]
    fn dashboard_totals_current_month_actuals() {
        let mut office = office();
        office.add_cash_flow_entry(CashFlowEntry::new(
            "Rent",
            2000.0,
            EntryType::Inflow,
            day(2026, 3, 1),
            now(),
        ));
        let mut projected =
            CashFlowEntry::new("Tax", 900.0, EntryType::Outflow, day(2026, 3, 15), now());
        projected.is_projected = true;
        office.add_cash_flow_entry(projected);
        office.add_cash_flow_entry(CashFlowEntry::new(
            "February",
            50.0,
            EntryType::Outflow,
            day(2026, 2, 28),
            now(),
        ));

        let dashboard = ScheduleService::dashboard(&office, now(), 14, 30);
        assert_eq!(dashboard.month_cash_flow.count, 1);
        assert_eq!(dashboard.month_cash_flow.net, 2000.0);
        assert_eq!(dashboard.meetings.len(), 1);
        assert_eq!(dashboard.overdue.len(), 1);
    }
}
