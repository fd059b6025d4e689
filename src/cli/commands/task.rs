use uuid::Uuid;

use cc_core::{RecurrenceService, TaskDraft, TaskService};
use cc_domain::{FollowUp, TaskDirection, TaskPriority, TaskStatus, TaskType};

use crate::cli::core::{
    parse_count, parse_date, parse_days, parse_optional_rule, parse_time, resolve_task, usage,
    CommandError, CommandResult, ParsedArgs, ShellContext,
};
use crate::cli::format::{due_label, format_date, rule_label, short_id};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

const USAGE: &str =
    "task <add|list|show|status|complete|toggle|bulk-complete|due|repeat|remove|subtask|followup>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "task",
        "Track tasks, checklists and follow-ups",
        "task add <title> [--due YYYY-MM-DD] [--time HH:MM] [--priority critical|high|medium|low] [--type one_time|reference|meeting] [--direction personal|outbound|inbound] [--repeat <rule>] | task list [open|done|all] | task show|complete|toggle|remove <task> | task status <task> <not_started|in_progress|waiting|complete> | task bulk-complete <task>... | task due <task> <date|none> | task repeat <task> <rule|none> | task subtask <task> add <title>|toggle <n> | task followup <task> add <method> [--days N] [--remind]|respond <n> [notes]",
        cmd_task,
    )]
}

fn cmd_task(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((subcommand, rest)) = args.split_first() else {
        return Err(usage(USAGE));
    };
    match subcommand.to_ascii_lowercase().as_str() {
        "add" => handle_add(context, rest),
        "list" => handle_list(context, rest),
        "show" => handle_show(context, rest),
        "status" => handle_status(context, rest),
        "complete" | "done" => handle_complete(context, rest),
        "toggle" => handle_toggle(context, rest),
        "bulk-complete" => handle_bulk_complete(context, rest),
        "due" => handle_due(context, rest),
        "repeat" => handle_repeat(context, rest),
        "remove" => handle_remove(context, rest),
        "subtask" => handle_subtask(context, rest),
        "followup" => handle_follow_up(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown task subcommand `{}`; {}",
            other, USAGE
        ))),
    }
}

fn handle_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[])?;
    let title = parsed.text();
    if title.trim().is_empty() {
        return Err(usage("task add <title> [--due YYYY-MM-DD] [--repeat <rule>]"));
    }

    let mut draft = TaskDraft::new(title);
    if let Some(due) = parsed.get("due") {
        draft.due_date = Some(parse_date(due)?);
    }
    if let Some(time) = parsed.get("time") {
        draft.due_time = Some(parse_time(time)?);
    }
    if let Some(priority) = parsed.get("priority") {
        draft.priority = TaskPriority::from_key(priority)
            .ok_or_else(|| invalid_choice("priority", priority))?;
    }
    if let Some(task_type) = parsed.get("type") {
        draft.task_type =
            TaskType::from_key(task_type).ok_or_else(|| invalid_choice("type", task_type))?;
    }
    if let Some(direction) = parsed.get("direction") {
        draft.direction = TaskDirection::from_key(direction)
            .ok_or_else(|| invalid_choice("direction", direction))?;
    }
    if let Some(rule) = parsed.get("repeat") {
        draft.is_recurring = true;
        draft.recurrence_rule = Some(rule.to_string());
    }

    let id = context.with_office_mut(|office, clock| {
        Ok(TaskService::create(office, draft, clock)?)
    })?;
    output::success(format!("Task added ({}).", short_id(id)));
    Ok(())
}

fn handle_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let filter = args.first().map(|value| value.to_ascii_lowercase());
    let show = |status: TaskStatus| match filter.as_deref() {
        None | Some("open") => status != TaskStatus::Complete,
        Some("done") => status == TaskStatus::Complete,
        _ => true,
    };
    if let Some(other) = filter.as_deref() {
        if !matches!(other, "open" | "done" | "all") {
            return Err(usage("task list [open|done|all]"));
        }
    }

    context.with_office(|office| {
        let mut table = Table::new(
            Some("Tasks"),
            vec![
                TableColumn::numeric("#"),
                TableColumn::new("Id"),
                TableColumn::new("Title"),
                TableColumn::new("Due"),
                TableColumn::new("Status"),
                TableColumn::new("Priority"),
                TableColumn::new("Repeats"),
            ],
        );
        for (idx, task) in TaskService::list(office).into_iter().enumerate() {
            if !show(task.status) {
                continue;
            }
            let (done, total) = task.checklist_progress();
            let title = if total > 0 {
                format!("{} [{}/{}]", task.title, done, total)
            } else {
                task.title.clone()
            };
            table.add_row(vec![
                (idx + 1).to_string(),
                short_id(task.id),
                title,
                due_label(task),
                task.status.to_string(),
                task.priority.to_string(),
                rule_label(task.recurrence).to_string(),
            ]);
        }
        if table.is_empty() {
            output::info("No tasks to show.");
        } else {
            table.print();
        }
        Ok(())
    })
}

fn handle_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(usage("task show <task>"));
    };
    let now = context.now();
    context.with_office(|office| {
        let id = resolve_task(office, reference)?;
        let task = office.task(id).ok_or(cc_core::CoreError::TaskNotFound(id))?;
        output::section(format!("Task: {}", task.title));
        output::plain(format!("  Id          : {}", task.id));
        output::plain(format!("  Status      : {}", task.status));
        output::plain(format!("  Priority    : {}", task.priority));
        output::plain(format!("  Type        : {}", task.task_type));
        output::plain(format!("  Direction   : {}", task.direction));
        output::plain(format!("  Due         : {}", due_label(task)));
        output::plain(format!("  Repeats     : {}", rule_label(task.recurrence)));
        if let Some(next) = task.next_due_date() {
            output::plain(format!("  Next due    : {}", format_date(next)));
        }
        if let Some(parent) = task.recurrence_parent {
            output::plain(format!("  Continues   : {}", short_id(parent)));
        }
        if !task.description.is_empty() {
            output::plain(format!("  Notes       : {}", task.description));
        }

        if !task.subtasks.is_empty() {
            output::section("Checklist");
            for (idx, subtask) in sorted_subtasks(task).into_iter().enumerate() {
                let mark = if subtask.is_completed { "x" } else { " " };
                output::plain(format!("  {}. [{}] {}", idx + 1, mark, subtask.title));
            }
        }

        if !task.follow_ups.is_empty() {
            output::section("Follow-ups");
            for (idx, follow_up) in task.follow_ups.iter().enumerate() {
                let due = follow_up.reminder_due_at();
                let state = if follow_up.response_received {
                    "answered".to_string()
                } else if now > due {
                    format!("no reply since {}", due.format("%Y-%m-%d"))
                } else {
                    format!("waiting until {}", due.format("%Y-%m-%d"))
                };
                output::plain(format!(
                    "  {}. {} via {} ({})",
                    idx + 1,
                    follow_up.outreach_at.format("%Y-%m-%d"),
                    follow_up.method,
                    state
                ));
            }
        }
        Ok(())
    })
}

fn handle_status(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference, status] = args else {
        return Err(usage(
            "task status <task> <not_started|in_progress|waiting|complete>",
        ));
    };
    let status = TaskStatus::from_key(status).ok_or_else(|| invalid_choice("status", status))?;
    let spawned = context.with_office_mut(|office, clock| {
        let id = resolve_task(office, reference)?;
        Ok(TaskService::set_status(office, id, status, clock)?)
    })?;
    output::success(format!("Task marked {}.", status));
    report_spawned(context, spawned);
    Ok(())
}

fn handle_complete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(usage("task complete <task>"));
    };
    let spawned = context.with_office_mut(|office, clock| {
        let id = resolve_task(office, reference)?;
        Ok(TaskService::set_status(office, id, TaskStatus::Complete, clock)?)
    })?;
    output::success("Task completed.");
    report_spawned(context, spawned);
    Ok(())
}

fn handle_toggle(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(usage("task toggle <task>"));
    };
    let (spawned, status) = context.with_office_mut(|office, clock| {
        let id = resolve_task(office, reference)?;
        let spawned = TaskService::toggle_complete(office, id, clock)?;
        let status = office.task(id).map(|task| task.status);
        Ok((spawned, status))
    })?;
    if let Some(status) = status {
        output::success(format!("Task is now {}.", status));
    }
    report_spawned(context, spawned);
    Ok(())
}

fn handle_bulk_complete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return Err(usage("task bulk-complete <task> [task...]"));
    }
    let result = context.with_office_mut(|office, clock| {
        let ids = args
            .iter()
            .map(|reference| resolve_task(office, reference))
            .collect::<Result<Vec<Uuid>, CommandError>>()?;
        Ok(TaskService::bulk_complete(office, &ids, clock)?)
    })?;
    output::success(format!("{} task(s) completed.", result.completed));
    if !result.spawned.is_empty() {
        output::info(format!(
            "{} recurring task(s) scheduled again.",
            result.spawned.len()
        ));
    }
    Ok(())
}

fn handle_due(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference, value] = args else {
        return Err(usage("task due <task> <YYYY-MM-DD|none>"));
    };
    let due = if value.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(parse_date(value)?)
    };
    context.with_office_mut(|office, clock| {
        let id = resolve_task(office, reference)?;
        Ok(TaskService::set_due_date(office, id, due, clock)?)
    })?;
    match due {
        Some(date) => output::success(format!("Due date set to {}.", format_date(date))),
        None => output::success("Due date cleared."),
    }
    Ok(())
}

fn handle_repeat(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference, value] = args else {
        return Err(usage("task repeat <task> <rule|none>"));
    };
    let rule = parse_optional_rule(value)?;
    context.with_office_mut(|office, clock| {
        let id = resolve_task(office, reference)?;
        match rule {
            Some(rule) => RecurrenceService::set_task_rule(office, id, rule, clock)?,
            None => {
                RecurrenceService::clear_task_rule(office, id, clock)?;
            }
        }
        Ok(())
    })?;
    match rule {
        Some(rule) => output::success(format!(
            "Task now repeats {}.",
            rule.label().to_lowercase()
        )),
        None => output::success("Task no longer repeats."),
    }
    Ok(())
}

fn handle_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(usage("task remove <task>"));
    };
    let removed = context.with_office_mut(|office, _| {
        let id = resolve_task(office, reference)?;
        Ok(TaskService::remove(office, id)?)
    })?;
    output::success(format!("Task `{}` removed.", removed.title));
    Ok(())
}

fn handle_subtask(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    const SUBTASK_USAGE: &str = "task subtask <task> add <title> | task subtask <task> toggle <n>";
    let [reference, action, rest @ ..] = args else {
        return Err(usage(SUBTASK_USAGE));
    };
    match action.to_ascii_lowercase().as_str() {
        "add" if !rest.is_empty() => {
            let title = rest.join(" ");
            context.with_office_mut(|office, clock| {
                let id = resolve_task(office, reference)?;
                Ok(TaskService::add_subtask(office, id, &title, clock)?)
            })?;
            output::success(format!("Checklist item `{}` added.", title));
            Ok(())
        }
        "toggle" if rest.len() == 1 => {
            let position = parse_count(rest[0], "checklist number")?;
            let completed = context.with_office_mut(|office, clock| {
                let id = resolve_task(office, reference)?;
                let subtask_id = office
                    .task(id)
                    .and_then(|task| sorted_subtasks(task).get(position - 1).map(|s| s.id))
                    .ok_or_else(|| {
                        CommandError::InvalidArguments(format!("no checklist item {}", position))
                    })?;
                Ok(TaskService::toggle_subtask(office, id, subtask_id, clock)?)
            })?;
            let state = if completed { "done" } else { "open" };
            output::success(format!("Checklist item {} is now {}.", position, state));
            Ok(())
        }
        _ => Err(usage(SUBTASK_USAGE)),
    }
}

fn handle_follow_up(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    const FOLLOW_UP_USAGE: &str =
        "task followup <task> add <method> [--days N] [--remind] | task followup <task> respond <n> [notes]";
    let [reference, action, rest @ ..] = args else {
        return Err(usage(FOLLOW_UP_USAGE));
    };
    match action.to_ascii_lowercase().as_str() {
        "add" => {
            let parsed = ParsedArgs::parse(rest, &["remind"])?;
            let method = parsed.text();
            if method.trim().is_empty() {
                return Err(usage(FOLLOW_UP_USAGE));
            }
            let mut follow_up = FollowUp::new(context.now(), method.clone());
            follow_up.reminder_enabled = parsed.has("remind");
            if let Some(days) = parsed.get("days") {
                follow_up.follow_up_days = parse_days(days)?;
            }
            let remind_at = follow_up.reminder_due_at();
            context.with_office_mut(|office, clock| {
                let id = resolve_task(office, reference)?;
                Ok(TaskService::add_follow_up(office, id, follow_up, clock)?)
            })?;
            output::success(format!(
                "Follow-up via {} logged; check back after {}.",
                method,
                remind_at.format("%Y-%m-%d")
            ));
            Ok(())
        }
        "respond" if !rest.is_empty() => {
            let position = parse_count(rest[0], "follow-up number")?;
            let notes = rest[1..].join(" ");
            context.with_office_mut(|office, clock| {
                let id = resolve_task(office, reference)?;
                let follow_up_id = office
                    .task(id)
                    .and_then(|task| task.follow_ups.get(position - 1).map(|f| f.id))
                    .ok_or_else(|| {
                        CommandError::InvalidArguments(format!("no follow-up {}", position))
                    })?;
                Ok(TaskService::record_follow_up_response(
                    office,
                    id,
                    follow_up_id,
                    &notes,
                    clock,
                )?)
            })?;
            output::success("Response recorded.");
            Ok(())
        }
        _ => Err(usage(FOLLOW_UP_USAGE)),
    }
}

fn sorted_subtasks(task: &cc_domain::Task) -> Vec<&cc_domain::SubTask> {
    let mut subtasks: Vec<_> = task.subtasks.iter().collect();
    subtasks.sort_by_key(|subtask| subtask.sort_order);
    subtasks
}

fn report_spawned(context: &ShellContext, spawned: Option<Uuid>) {
    let Some(id) = spawned else {
        return;
    };
    let due = context
        .manager
        .current()
        .and_then(|office| office.task(id))
        .and_then(|task| task.due_date);
    match due {
        Some(date) => output::info(format!(
            "Next occurrence scheduled for {} ({}).",
            format_date(date),
            short_id(id)
        )),
        None => output::info(format!("Next occurrence created ({}).", short_id(id))),
    }
}

fn invalid_choice(field: &str, value: &str) -> CommandError {
    CommandError::InvalidArguments(format!("unknown {field} `{value}`"))
}
