//! Line-oriented front end: an interactive rustyline prompt or a script fed on stdin.

use std::{
    borrow::Cow,
    io::{self, BufRead},
    path::PathBuf,
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::{ValidationContext, ValidationResult, Validator},
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};

use crate::cli::core::{CliError, CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandRegistry;
use crate::core::paths::app_data_dir;

/// Selects script mode: commands are read line by line from stdin.
pub const SCRIPT_ENV: &str = "CONTROL_CENTER_CLI_SCRIPT";

const HISTORY_FILE: &str = "history.txt";
const COMMENT_PREFIX: char = '#';

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;
    tracing::info!(?mode, "shell started");

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(CommandHelper::from_registry(&context.registry)));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);

    let history = history_path();
    if editor.load_history(&history).is_err() {
        tracing::debug!(path = %history.display(), "no shell history yet");
    }
    output::info("Type `help` to list commands, `exit` to quit.");

    while context.running {
        let prompt = context.prompt();
        match editor.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                editor.add_history_entry(trimmed).ok();
                match handle_line(context, trimmed) {
                    Ok(LoopControl::Continue) => {}
                    Ok(LoopControl::Exit) => break,
                    Err(err) => context.report_error(err)?,
                }
            }
            Err(ReadlineError::Interrupted) => {
                output::info("Press Ctrl-D or type `exit` to quit.");
            }
            Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    if let Err(err) = editor.save_history(&history) {
        tracing::warn!(error = %err, "could not save shell history");
    }
    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    for (number, line) in stdin.lock().lines().enumerate() {
        if !context.running {
            break;
        }
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
            continue;
        }
        match handle_line(context, trimmed) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => {
                tracing::debug!(line = number + 1, error = %err, "script line failed");
                context.report_error(err)?;
            }
        }
    }
    Ok(())
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let tokens = match parse_command_line(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(err);
            return Ok(LoopControl::Continue);
        }
    };
    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    context.last_command = Some(line.to_string());

    let control = context.dispatch(&raw.to_lowercase(), raw, &args)?;
    if control == LoopControl::Exit {
        context.running = false;
    }
    Ok(control)
}

fn history_path() -> PathBuf {
    app_data_dir().join(HISTORY_FILE)
}

/// Splits a command line into words, honouring shell-style quotes.
pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    shell_words::split(input).map_err(ParseError)
}

#[derive(Debug, thiserror::Error)]
#[error("could not parse command: {0}")]
pub(crate) struct ParseError(shell_words::ParseError);

/// Completes command words and, after a command, its subcommand words.
struct CommandHelper {
    commands: Vec<(String, Vec<String>)>,
}

impl CommandHelper {
    fn from_registry(registry: &CommandRegistry) -> Self {
        let commands = registry
            .list()
            .map(|entry| {
                let mut words: Vec<String> = entry
                    .usage_forms()
                    .filter_map(|form| form.split_whitespace().nth(1))
                    .flat_map(|word| word.split('|'))
                    .filter(|word| word.chars().all(|c| c.is_ascii_lowercase() || c == '-'))
                    .filter(|word| !word.is_empty())
                    .map(str::to_string)
                    .collect();
                words.sort();
                words.dedup();
                (entry.name.to_ascii_lowercase(), words)
            })
            .collect();
        Self { commands }
    }

    fn candidates(&self, words_before: &[&str], needle: &str) -> Vec<Pair> {
        let needle = needle.to_ascii_lowercase();
        let pool: Vec<&String> = match words_before {
            [] => self.commands.iter().map(|(name, _)| name).collect(),
            [command] => self
                .commands
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(command))
                .map(|(_, words)| words.iter().collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        pool.into_iter()
            .filter(|word| word.starts_with(&needle))
            .map(|word| Pair {
                display: word.clone(),
                replacement: word.clone(),
            })
            .collect()
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let start = prefix
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let before: Vec<&str> = prefix[..start].split_whitespace().collect();
        Ok((start, self.candidates(&before, &prefix[start..])))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for CommandHelper {
    fn validate(&self, _ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    fn helper() -> CommandHelper {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);
        CommandHelper::from_registry(&registry)
    }

    fn replacements(pairs: Vec<Pair>) -> Vec<String> {
        pairs.into_iter().map(|pair| pair.replacement).collect()
    }

    #[test]
    fn quoted_words_stay_together() {
        let tokens = parse_command_line(r#"task add "Call the bank" --due 2026-04-01"#).unwrap();
        assert_eq!(tokens, vec!["task", "add", "Call the bank", "--due", "2026-04-01"]);
        assert!(parse_command_line("task add \"unterminated").is_err());
    }

    #[test]
    fn completion_covers_commands_and_subcommands() {
        let helper = helper();
        assert_eq!(replacements(helper.candidates(&[], "CO")), vec!["config"]);
        assert_eq!(
            replacements(helper.candidates(&["office"], "ba")),
            vec!["backup", "backups"]
        );
        assert_eq!(
            replacements(helper.candidates(&["cashflow"], "fo")),
            vec!["forecast"]
        );
        assert!(helper.candidates(&["next"], "").is_empty());
    }
}
