//! Core CLI loop, dispatch, and shell context helpers.

use std::{collections::HashMap, io};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use cc_config::ConfigError;
use cc_core::{CashFlowService, CoreError, TaskService};
use cc_domain::{Office, RecurrenceRule};

pub use crate::cli::shell_context::{CliMode, ShellContext};
pub use crate::core::errors::CliError;

use super::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

/// List positions above this are treated as id prefixes instead.
const MAX_LIST_POSITION_DIGITS: usize = 4;

impl ShellContext {
    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            tracing::debug!(command, args = args.len(), "dispatching command");
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match crate::cli::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                output::warning(err);
                return Ok(LoopControl::Continue);
            }
        };

        if tokens.is_empty() {
            return Ok(LoopControl::Continue);
        }

        let command = tokens[0].to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.dispatch(&command, &tokens[0], &args)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        if let Some(best) = self.registry.closest(input) {
            output::info(format!("Suggestion: `{}`?", best));
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::OfficeNotLoaded => {
                output::error(CommandError::OfficeNotLoaded);
                output::hint("Try `office new Home` to get started.");
                Ok(())
            }
            CommandError::Io(err) if self.mode == CliMode::Script => Err(err.into()),
            other => {
                output::error(other);
                Ok(())
            }
        }
    }

    pub(crate) fn with_office<T>(
        &self,
        f: impl FnOnce(&Office) -> Result<T, CommandError>,
    ) -> Result<T, CommandError> {
        let office = self.manager.current().ok_or(CommandError::OfficeNotLoaded)?;
        f(office)
    }

    pub(crate) fn with_office_mut<T>(
        &mut self,
        f: impl FnOnce(&mut Office, &dyn cc_core::Clock) -> Result<T, CommandError>,
    ) -> Result<T, CommandError> {
        let clock = self.clock.clone();
        let office = self
            .manager
            .current_mut()
            .ok_or(CommandError::OfficeNotLoaded)?;
        f(office, clock.as_ref())
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub(crate) fn currency(&self) -> &str {
        &self.config.currency
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    /// Records the office to reopen on the next interactive start.
    pub(crate) fn remember_office(&mut self, name: Option<&str>) -> CommandResult {
        self.config.last_opened_office = name.map(str::to_string);
        self.persist_config()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("No office loaded. Use `office new` or `office load` first.")]
    OfficeNotLoaded,
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

pub(crate) fn usage(text: &str) -> CommandError {
    CommandError::InvalidArguments(format!("usage: {text}"))
}

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{}` (use YYYY-MM-DD)", input))
    })
}

pub(crate) fn parse_time(input: &str) -> Result<NaiveTime, CommandError> {
    NaiveTime::parse_from_str(input, "%H:%M").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid time `{}` (use HH:MM)", input))
    })
}

pub(crate) fn parse_rule(input: &str) -> Result<RecurrenceRule, CommandError> {
    input
        .parse::<RecurrenceRule>()
        .map_err(|err| CommandError::InvalidArguments(err.to_string()))
}

/// `none`/`off` clear a rule; anything else must name one.
pub(crate) fn parse_optional_rule(input: &str) -> Result<Option<RecurrenceRule>, CommandError> {
    if matches!(input.to_ascii_lowercase().as_str(), "none" | "off") {
        Ok(None)
    } else {
        parse_rule(input).map(Some)
    }
}

pub(crate) fn parse_amount(input: &str) -> Result<f64, CommandError> {
    let cleaned = input.trim().replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(CommandError::InvalidArguments(format!(
            "invalid amount `{}` (use a non-negative number such as 1200.50)",
            input
        ))),
    }
}

pub(crate) fn parse_count(input: &str, what: &str) -> Result<usize, CommandError> {
    match input.parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(CommandError::InvalidArguments(format!(
            "invalid {what} `{input}` (use a positive whole number)"
        ))),
    }
}

/// Parses a positive day count that fits the date arithmetic.
pub(crate) fn parse_days(input: &str) -> Result<u32, CommandError> {
    let days = parse_count(input, "number of days")?;
    u32::try_from(days).map_err(|_| {
        CommandError::InvalidArguments(format!("number of days `{input}` is too large"))
    })
}

/// Resolves a task by its position in `task list` or by an id prefix.
pub(crate) fn resolve_task(office: &Office, reference: &str) -> Result<Uuid, CommandError> {
    if let Some(position) = list_position(reference) {
        return TaskService::list(office)
            .get(position)
            .map(|task| task.id)
            .ok_or_else(|| not_found("task", reference));
    }
    office
        .find_task_id(reference)
        .ok_or_else(|| not_found("task", reference))
}

/// Resolves a cash-flow entry by its position in `cashflow list` or by an id prefix.
pub(crate) fn resolve_entry(office: &Office, reference: &str) -> Result<Uuid, CommandError> {
    if let Some(position) = list_position(reference) {
        return CashFlowService::list(office)
            .get(position)
            .map(|entry| entry.id)
            .ok_or_else(|| not_found("cash flow entry", reference));
    }
    office
        .find_cash_flow_id(reference)
        .ok_or_else(|| not_found("cash flow entry", reference))
}

fn list_position(reference: &str) -> Option<usize> {
    if reference.len() > MAX_LIST_POSITION_DIGITS || !reference.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    reference.parse::<usize>().ok()?.checked_sub(1)
}

fn not_found(what: &str, reference: &str) -> CommandError {
    CommandError::InvalidArguments(format!(
        "no {what} matches `{reference}` (use a list number or a unique id prefix)"
    ))
}

/// Positional words plus `--flag value` / `--switch` options.
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs<'a> {
    pub positional: Vec<&'a str>,
    options: HashMap<String, &'a str>,
    switches: Vec<String>,
}

impl<'a> ParsedArgs<'a> {
    /// Splits `args`; names in `switches` take no value.
    pub fn parse(args: &[&'a str], switches: &[&str]) -> Result<Self, CommandError> {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let Some(name) = arg.strip_prefix("--") else {
                parsed.positional.push(*arg);
                continue;
            };
            let name = name.to_ascii_lowercase();
            if switches.contains(&name.as_str()) {
                parsed.switches.push(name);
            } else if let Some(value) = iter.next() {
                parsed.options.insert(name, *value);
            } else {
                return Err(CommandError::InvalidArguments(format!(
                    "option `--{name}` needs a value"
                )));
            }
        }
        Ok(parsed)
    }

    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.options.get(name).copied()
    }

    pub fn has(&self, name: &str) -> bool {
        self.switches.iter().any(|switch| switch == name)
    }

    /// Positional words joined with spaces.
    pub fn text(&self) -> String {
        self.positional.join(" ")
    }
}

#[cfg(test)]
pub(crate) fn test_context(dir: &std::path::Path) -> ShellContext {
    use chrono::TimeZone;
    use std::sync::Arc;

    let config_manager =
        cc_config::ConfigManager::with_base_dir(dir.to_path_buf()).expect("config manager");
    let mut config = cc_config::Config::default();
    config.ui_color_enabled = false;
    let paths = cc_storage_json::StoragePaths {
        office_root: dir.join("offices"),
        backup_root: dir.join("backups"),
    };
    let clock = cc_core::FixedClock(Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap());
    ShellContext::with_components(CliMode::Script, config_manager, config, paths, Arc::new(clock))
        .expect("shell context")
}

#[cfg(test)]
pub(crate) fn process_script(
    context: &mut ShellContext,
    lines: &[&str],
) -> Result<(), CommandError> {
    for line in lines {
        match context.process_line(line)? {
            LoopControl::Continue => {}
            LoopControl::Exit => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_domain::TaskStatus;
    use tempfile::TempDir;

    #[test]
    fn day_counts_must_fit_in_u32() {
        assert_eq!(parse_days("30").unwrap(), 30);
        assert_eq!(parse_days("4294967295").unwrap(), u32::MAX);
        assert!(matches!(
            parse_days("4294967297"),
            Err(CommandError::InvalidArguments(_))
        ));
        assert!(parse_days("0").is_err());
    }

    #[test]
    fn exit_stops_the_loop() {
        let dir = TempDir::new().unwrap();
        let mut context = test_context(dir.path());
        assert_eq!(context.process_line("exit").unwrap(), LoopControl::Exit);
        assert_eq!(context.process_line("hlep").unwrap(), LoopControl::Continue);
    }

    #[test]
    fn commands_require_an_office() {
        let dir = TempDir::new().unwrap();
        let mut context = test_context(dir.path());
        assert!(matches!(
            context.process_line("task list"),
            Err(CommandError::OfficeNotLoaded)
        ));
    }

    #[test]
    fn completing_a_recurring_task_schedules_the_next_one() {
        let dir = TempDir::new().unwrap();
        let mut context = test_context(dir.path());
        process_script(
            &mut context,
            &[
                "office new Home",
                "task add Pay rent --due 2026-01-31 --repeat monthly",
                "task complete 1",
            ],
        )
        .unwrap();

        let office = context.manager.current().unwrap();
        assert_eq!(office.tasks.len(), 2);
        let next = office
            .tasks
            .iter()
            .find(|task| task.status == TaskStatus::NotStarted)
            .unwrap();
        assert_eq!(next.due_date, NaiveDate::from_ymd_opt(2026, 2, 28));
        assert_eq!(next.recurrence_parent, Some(office.tasks[0].id));
    }

    #[test]
    fn office_round_trips_through_named_storage() {
        let dir = TempDir::new().unwrap();
        let mut context = test_context(dir.path());
        process_script(
            &mut context,
            &[
                "office new Home",
                "cashflow add out 1200 2026-03-01 Rent --repeat monthly",
                "office save",
            ],
        )
        .unwrap();

        let mut reopened = test_context(dir.path());
        reopened.process_line("office load Home").unwrap();
        let office = reopened.manager.current().unwrap();
        assert_eq!(office.cash_flow.len(), 1);
        assert_eq!(office.cash_flow[0].recurrence, Some(RecurrenceRule::Monthly));
        assert_eq!(
            reopened.config_manager.load().unwrap().last_opened_office.as_deref(),
            Some("Home")
        );
    }

    #[test]
    fn bad_dates_are_argument_errors() {
        assert!(matches!(
            parse_date("03/01/2026"),
            Err(CommandError::InvalidArguments(_))
        ));
        assert!(matches!(parse_amount("-4"), Err(CommandError::InvalidArguments(_))));
        assert_eq!(parse_amount("1,250.5").unwrap(), 1250.5);
        assert_eq!(parse_optional_rule("none").unwrap(), None);
    }

    #[test]
    fn parsed_args_split_options_from_words() {
        let args = ["Call", "the", "bank", "--due", "2026-04-01", "--remind"];
        let parsed = ParsedArgs::parse(&args, &["remind"]).unwrap();
        assert_eq!(parsed.text(), "Call the bank");
        assert_eq!(parsed.get("due"), Some("2026-04-01"));
        assert!(parsed.has("remind"));
        assert!(ParsedArgs::parse(&["--due"], &[]).is_err());
    }
}
