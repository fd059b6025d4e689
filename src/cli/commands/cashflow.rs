use chrono::{Datelike, Months, NaiveDate};

use cc_core::{CashFlowDraft, CashFlowService, CashFlowTotals, RecurrenceService};
use cc_domain::{DateWindow, EntryType};

use crate::cli::core::{
    parse_amount, parse_date, parse_days, parse_optional_rule, resolve_entry, usage,
    CommandError, CommandResult, ParsedArgs, ShellContext,
};
use crate::cli::format::{format_amount, format_date, format_signed, rule_label, short_id};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

const USAGE: &str = "cashflow <add|list|next|repeat|remove|summary|forecast>";
const DEFAULT_FORECAST_DAYS: u32 = 90;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "cashflow",
        "Record money in and out and project recurring entries",
        "cashflow add <in|out> <amount> <YYYY-MM-DD> <description> [--repeat <rule>] [--category <name>] [--projected] | cashflow list | cashflow next|remove <entry> | cashflow repeat <entry> <rule|none> | cashflow summary [start end] | cashflow forecast [days|start end]",
        cmd_cashflow,
    )]
}

fn cmd_cashflow(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((subcommand, rest)) = args.split_first() else {
        return Err(usage(USAGE));
    };
    match subcommand.to_ascii_lowercase().as_str() {
        "add" => handle_add(context, rest),
        "list" => handle_list(context),
        "next" => handle_next(context, rest),
        "repeat" => handle_repeat(context, rest),
        "remove" => handle_remove(context, rest),
        "summary" => handle_summary(context, rest),
        "forecast" => handle_forecast(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown cashflow subcommand `{}`; {}",
            other, USAGE
        ))),
    }
}

fn handle_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    const ADD_USAGE: &str = "cashflow add <in|out> <amount> <YYYY-MM-DD> <description> [--repeat <rule>] [--category <name>] [--projected]";
    let parsed = ParsedArgs::parse(args, &["projected"])?;
    let [kind, amount, date, description @ ..] = parsed.positional.as_slice() else {
        return Err(usage(ADD_USAGE));
    };
    if description.is_empty() {
        return Err(usage(ADD_USAGE));
    }
    let entry_type = EntryType::from_key(kind).ok_or_else(|| {
        CommandError::InvalidArguments(format!("unknown entry type `{kind}` (use in or out)"))
    })?;

    let mut draft = CashFlowDraft::new(
        description.join(" "),
        parse_amount(amount)?,
        entry_type,
        parse_date(date)?,
    );
    draft.is_projected = parsed.has("projected");
    if let Some(category) = parsed.get("category") {
        draft.category = category.to_string();
    }
    if let Some(rule) = parsed.get("repeat") {
        draft.is_recurring = true;
        draft.recurrence_rule = Some(rule.to_string());
    }

    let id = context.with_office_mut(|office, clock| {
        Ok(CashFlowService::create(office, draft, clock)?)
    })?;
    output::success(format!("Cash flow entry added ({}).", short_id(id)));
    Ok(())
}

fn handle_list(context: &mut ShellContext) -> CommandResult {
    let currency = context.currency().to_string();
    context.with_office(|office| {
        let entries = CashFlowService::list(office);
        if entries.is_empty() {
            output::info("No cash flow entries yet.");
            return Ok(());
        }
        let mut table = Table::new(
            Some("Cash flow"),
            vec![
                TableColumn::numeric("#"),
                TableColumn::new("Id"),
                TableColumn::new("Date"),
                TableColumn::new("Description"),
                TableColumn::new("Category"),
                TableColumn::numeric("Amount"),
                TableColumn::new("Repeats"),
            ],
        );
        for (idx, entry) in entries.into_iter().enumerate() {
            let description = if entry.is_projected {
                format!("{} (projected)", entry.description)
            } else {
                entry.description.clone()
            };
            table.add_row(vec![
                (idx + 1).to_string(),
                short_id(entry.id),
                format_date(entry.date),
                description,
                entry.category.clone(),
                format_signed(entry.signed_amount(), &currency),
                rule_label(entry.recurrence).to_string(),
            ]);
        }
        table.print();
        Ok(())
    })
}

fn handle_next(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(usage("cashflow next <entry>"));
    };
    let (id, date) = context.with_office_mut(|office, clock| {
        let source = resolve_entry(office, reference)?;
        let id = CashFlowService::record_next_occurrence(office, source, clock)?;
        let date = office.cash_flow_entry(id).map(|entry| entry.date);
        Ok((id, date))
    })?;
    match date {
        Some(date) => output::success(format!(
            "Next occurrence recorded for {} ({}).",
            format_date(date),
            short_id(id)
        )),
        None => output::success(format!("Next occurrence recorded ({}).", short_id(id))),
    }
    Ok(())
}

fn handle_repeat(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference, value] = args else {
        return Err(usage("cashflow repeat <entry> <rule|none>"));
    };
    let rule = parse_optional_rule(value)?;
    context.with_office_mut(|office, _| {
        let id = resolve_entry(office, reference)?;
        Ok(RecurrenceService::set_cash_flow_rule(office, id, rule)?)
    })?;
    match rule {
        Some(rule) => output::success(format!("Entry now repeats {}.", rule.label().to_lowercase())),
        None => output::success("Entry no longer repeats."),
    }
    Ok(())
}

fn handle_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(usage("cashflow remove <entry>"));
    };
    let removed = context.with_office_mut(|office, _| {
        let id = resolve_entry(office, reference)?;
        Ok(CashFlowService::remove(office, id)?)
    })?;
    output::success(format!("Entry `{}` removed.", removed.description));
    Ok(())
}

fn handle_summary(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let window = match args {
        [] => month_window(context.today())?,
        [start, end] => window_between(start, end)?,
        _ => return Err(usage("cashflow summary [start end]")),
    };
    let currency = context.currency().to_string();
    context.with_office(|office| {
        let totals = CashFlowService::summarize(office, window);
        output::section(format!("Cash flow {}", describe_window(window)));
        print_totals(&totals, &currency);
        Ok(())
    })
}

fn handle_forecast(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let today = context.today();
    let window = match args {
        [] => days_window(today, DEFAULT_FORECAST_DAYS)?,
        [days] => days_window(today, parse_days(days)?)?,
        [start, end] => window_between(start, end)?,
        _ => return Err(usage("cashflow forecast [days|start end]")),
    };
    let currency = context.currency().to_string();
    context.with_office(|office| {
        let forecast = CashFlowService::forecast(office, window);
        output::section(format!("Forecast {}", describe_window(window)));
        output::plain("Recorded:");
        print_totals(&forecast.recorded, &currency);

        if forecast.projected.is_empty() {
            output::info("No recurring entries fall inside this window.");
        } else {
            let mut table = Table::new(
                Some("Projected occurrences"),
                vec![
                    TableColumn::new("Date"),
                    TableColumn::new("Description"),
                    TableColumn::numeric("Amount"),
                    TableColumn::new("Repeats"),
                ],
            );
            for projected in &forecast.projected {
                let signed = match projected.entry_type {
                    EntryType::Inflow => projected.amount,
                    EntryType::Outflow => -projected.amount,
                };
                table.add_row(vec![
                    format_date(projected.date),
                    projected.description.clone(),
                    format_signed(signed, &currency),
                    projected.rule.label().to_string(),
                ]);
            }
            table.print();
            output::plain("Projected:");
            print_totals(&forecast.projected_totals, &currency);
        }
        output::plain(format!(
            "  Combined net : {}",
            format_signed(forecast.combined_net(), &currency)
        ));
        Ok(())
    })
}

fn print_totals(totals: &CashFlowTotals, currency: &str) {
    output::plain(format!("  Entries      : {}", totals.count));
    output::plain(format!("  Inflow       : {}", format_amount(totals.inflow, currency)));
    output::plain(format!("  Outflow      : {}", format_amount(totals.outflow, currency)));
    output::plain(format!("  Net          : {}", format_signed(totals.net, currency)));
}

/// Calendar month containing `today`.
pub(crate) fn month_window(today: NaiveDate) -> Result<DateWindow, CommandError> {
    let start = today.with_day(1).unwrap_or(today);
    let end = start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| CommandError::InvalidArguments("date is out of range".into()))?;
    DateWindow::new(start, end).map_err(window_error)
}

fn days_window(start: NaiveDate, days: u32) -> Result<DateWindow, CommandError> {
    DateWindow::starting_at(start, days).map_err(window_error)
}

/// Inclusive `start..=end` as typed by the user.
fn window_between(start: &str, end: &str) -> Result<DateWindow, CommandError> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    let end = end
        .succ_opt()
        .ok_or_else(|| CommandError::InvalidArguments("date is out of range".into()))?;
    DateWindow::new(start, end).map_err(window_error)
}

fn describe_window(window: DateWindow) -> String {
    let last = window.end.pred_opt().unwrap_or(window.end);
    format!("{} to {}", format_date(window.start), format_date(last))
}

fn window_error(err: cc_domain::DateWindowError) -> CommandError {
    CommandError::InvalidArguments(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::core::{process_script, test_context};

    #[test]
    fn forecast_rejects_day_counts_beyond_u32() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = test_context(dir.path());
        process_script(&mut context, &["office new Home", "cashflow forecast 30"]).unwrap();
        assert!(matches!(
            context.process_line("cashflow forecast 4294967297"),
            Err(CommandError::InvalidArguments(_))
        ));
    }

    #[test]
    fn month_window_covers_whole_month() {
        let window = month_window(NaiveDate::from_ymd_opt(2026, 2, 17).unwrap()).unwrap();
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn typed_windows_include_the_end_date() {
        let window = window_between("2026-01-01", "2026-01-31").unwrap();
        assert!(window.contains(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()));
        assert!(window_between("2026-02-01", "2026-01-01").is_err());
        assert_eq!(describe_window(window), "2026-01-01 to 2026-01-31");
    }
}
