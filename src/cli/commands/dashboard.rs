use cc_core::{Dashboard, DeadlineKind, ScheduleService};
use cc_domain::Task;

use crate::cli::core::{usage, CommandResult, ShellContext};
use crate::cli::format::{due_label, format_amount, format_date, format_signed, short_id};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "dashboard",
        "Summarize overdue work, upcoming dates and this month's cash flow",
        "dashboard",
        cmd_dashboard,
    )]
}

fn cmd_dashboard(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if !args.is_empty() {
        return Err(usage("dashboard"));
    }
    let now = context.now();
    let upcoming_days = context.config.upcoming_window_days;
    let horizon_days = context.config.deadline_horizon_days;
    let currency = context.currency().to_string();

    context.with_office(|office| {
        let dashboard = ScheduleService::dashboard(office, now, upcoming_days, horizon_days);
        output::section(format!(
            "Dashboard: {} ({})",
            office.name,
            format_date(dashboard.today)
        ));
        print_task_block("Overdue", &dashboard.overdue, "Nothing is overdue.");
        print_task_block(
            &format!("Next {upcoming_days} days"),
            &dashboard.upcoming,
            "Nothing due soon.",
        );
        print_task_block("Meetings", &dashboard.meetings, "No meetings scheduled.");
        print_deadlines(&dashboard);
        print_stale_follow_ups(&dashboard);
        print_month(&dashboard, &currency);
        Ok(())
    })
}

fn print_task_block(title: &str, tasks: &[&Task], empty: &str) {
    if tasks.is_empty() {
        output::plain(format!("{title}: {empty}"));
        return;
    }
    let mut table = Table::new(
        Some(title),
        vec![
            TableColumn::new("Id"),
            TableColumn::new("Due"),
            TableColumn::new("Title"),
            TableColumn::new("Priority"),
            TableColumn::new("Status"),
        ],
    );
    for task in tasks {
        table.add_row(vec![
            short_id(task.id),
            due_label(task),
            task.title.clone(),
            task.priority.to_string(),
            task.status.to_string(),
        ]);
    }
    table.print();
}

fn print_deadlines(dashboard: &Dashboard<'_>) {
    if dashboard.deadlines.is_empty() {
        output::plain("Deadlines: none");
        return;
    }
    let mut table = Table::new(
        Some("Deadlines"),
        vec![
            TableColumn::new("Date"),
            TableColumn::new("Kind"),
            TableColumn::new("Title"),
        ],
    );
    for deadline in &dashboard.deadlines {
        let kind = match deadline.kind {
            DeadlineKind::Task => "task",
            DeadlineKind::Meeting => "meeting",
        };
        table.add_row(vec![
            format_date(deadline.date),
            kind.to_string(),
            deadline.title.clone(),
        ]);
    }
    table.print();
}

fn print_stale_follow_ups(dashboard: &Dashboard<'_>) {
    if dashboard.stale_follow_ups.is_empty() {
        output::plain("Waiting on replies: none");
        return;
    }
    let mut table = Table::new(
        Some("Waiting on replies"),
        vec![
            TableColumn::new("Task"),
            TableColumn::new("Method"),
            TableColumn::new("Sent"),
            TableColumn::numeric("Days"),
        ],
    );
    for stale in &dashboard.stale_follow_ups {
        table.add_row(vec![
            stale.task_title.clone(),
            stale.method.clone(),
            format_date(stale.outreach_at.date_naive()),
            stale.days_waiting.to_string(),
        ]);
    }
    table.print();
    output::hint("Use `task followup <task> respond <n>` once someone replies.");
}

fn print_month(dashboard: &Dashboard<'_>, currency: &str) {
    let totals = &dashboard.month_cash_flow;
    output::plain(format!(
        "This month: {} in, {} out, net {} ({} entries)",
        format_amount(totals.inflow, currency),
        format_amount(totals.outflow, currency),
        format_signed(totals.net, currency),
        totals.count
    ));
}

#[cfg(test)]
mod tests {
    use crate::cli::core::{process_script, test_context};

    #[test]
    fn dashboard_runs_on_a_populated_office() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = test_context(dir.path());
        process_script(
            &mut context,
            &[
                "office new Studio",
                "task add Renew lease --due 2026-03-01",
                "task add Client call --due 2026-03-12 --type meeting",
                "cashflow add in 1200 2026-03-05 Invoice 42",
                "dashboard",
            ],
        )
        .unwrap();
        let office = context.manager.current().unwrap();
        assert_eq!(office.tasks.len(), 2);
        assert_eq!(office.cash_flow.len(), 1);
    }

    #[test]
    fn dashboard_rejects_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = test_context(dir.path());
        process_script(&mut context, &["office new Studio"]).unwrap();
        assert!(context.process_line("dashboard extra").is_err());
    }
}
