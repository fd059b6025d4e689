use cc_core::RecurrenceService;
use cc_domain::{checked_next_occurrence, RecurrenceRule};

use crate::cli::core::{
    parse_count, parse_date, parse_rule, usage, CommandError, CommandResult, ShellContext,
};
use crate::cli::format::format_date;
use crate::cli::output;
use crate::cli::registry::CommandEntry;

const DEFAULT_PREVIEW_COUNT: usize = 5;
const MAX_PREVIEW_COUNT: usize = 366;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "next",
            "Show the next date a rule produces after a date",
            "next <YYYY-MM-DD> <daily|weekly|biweekly|monthly|quarterly|yearly>",
            cmd_next,
        ),
        CommandEntry::new(
            "preview",
            "List the upcoming dates a rule produces",
            "preview <YYYY-MM-DD> <rule> [count]",
            cmd_preview,
        ),
    ]
}

fn cmd_next(_context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [date, rule] = args else {
        return Err(usage("next <YYYY-MM-DD> <rule>"));
    };
    let base = parse_date(date)?;
    let rule = parse_rule(rule)?;
    let next = checked_next_occurrence(base, rule).ok_or_else(|| out_of_range(rule))?;
    output::plain(format_date(next));
    Ok(())
}

fn cmd_preview(_context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (anchor, rule, count) = match args {
        [date, rule] => (*date, *rule, DEFAULT_PREVIEW_COUNT),
        [date, rule, count] => (*date, *rule, parse_count(count, "count")?),
        _ => return Err(usage("preview <YYYY-MM-DD> <rule> [count]")),
    };
    if count == 0 || count > MAX_PREVIEW_COUNT {
        return Err(CommandError::InvalidArguments(format!(
            "count must be between 1 and {MAX_PREVIEW_COUNT}"
        )));
    }
    let anchor = parse_date(anchor)?;
    let rule = parse_rule(rule)?;

    let dates = RecurrenceService::preview(anchor, rule, count);
    if dates.is_empty() {
        return Err(out_of_range(rule));
    }
    output::section(format!("{} from {}", rule.label(), format_date(anchor)));
    for (idx, date) in dates.iter().enumerate() {
        output::plain(format!("{:>3}. {}", idx + 1, format_date(*date)));
    }
    Ok(())
}

fn out_of_range(rule: RecurrenceRule) -> CommandError {
    CommandError::Message(format!(
        "no {} occurrence fits in the supported date range",
        rule.as_str()
    ))
}
