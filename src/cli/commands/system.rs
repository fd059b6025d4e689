use cc_domain::CURRENT_SCHEMA_VERSION;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::help;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("version", "Show build metadata", "version", cmd_version),
        CommandEntry::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandEntry::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output::section(format!("Control Center {}", meta.version));
    output::plain(format!("  CLI version  : {}", build_info::CLI_VERSION));
    output::plain(format!("  Schema ver   : v{}", CURRENT_SCHEMA_VERSION));
    output::plain(format!(
        "  Build hash   : {} ({})",
        meta.git_hash, meta.git_status
    ));
    output::plain(format!("  Built at     : {}", meta.timestamp));
    output::plain(format!("  Target       : {}", meta.target));
    output::plain(format!("  Profile      : {}", meta.profile));
    output::plain(format!("  Rustc        : {}", meta.rustc));
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(first) = args.first() {
        match context.command(&first.to_lowercase()) {
            Some(entry) => help::print_command(entry),
            None => context.suggest_command(first),
        }
        return Ok(());
    }

    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
