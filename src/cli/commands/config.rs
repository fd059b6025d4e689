use cc_config::CONFIG_KEYS;

use crate::cli::core::{usage, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;

const USAGE: &str = "config <show|set|backup|backups|restore>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "View and change preferences",
        "config show | config set <key> <value> | config backup [note] | config backups | config restore <number|name>",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((subcommand, rest)) = args.split_first() else {
        return handle_show(context);
    };
    match subcommand.to_ascii_lowercase().as_str() {
        "show" => handle_show(context),
        "set" => handle_set(context, rest),
        "backup" => handle_backup(context, rest),
        "backups" => handle_list_backups(context),
        "restore" => handle_restore(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown config subcommand `{}`; {}",
            other, USAGE
        ))),
    }
}

fn handle_show(context: &mut ShellContext) -> CommandResult {
    output::section("Configuration");
    for (key, value) in context.config.entries() {
        output::plain(format!("  {key:<17}: {value}"));
    }
    Ok(())
}

fn handle_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [key, value @ ..] = args else {
        return Err(usage("config set <key> <value>"));
    };
    if value.is_empty() {
        return Err(CommandError::InvalidArguments(format!(
            "usage: config set <key> <value> (keys: {})",
            CONFIG_KEYS.join(", ")
        )));
    }
    let value = value.join(" ");
    context.config.set(key, &value)?;
    context.persist_config()?;
    output::set_color_enabled(context.config.ui_color_enabled);
    tracing::info!(key = %key, "configuration updated");
    output::success(format!("`{}` updated.", key.to_ascii_lowercase()));
    if matches!(
        key.to_ascii_lowercase().as_str(),
        "office_root" | "backup_root" | "backup_retention"
    ) {
        output::hint("Storage settings take effect the next time the shell starts.");
    }
    Ok(())
}

fn handle_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = (!args.is_empty()).then(|| args.join(" "));
    let name = context
        .config_manager
        .backup(&context.config, note.as_deref())?;
    output::success(format!("Configuration backup created: {}", name));
    Ok(())
}

fn handle_list_backups(context: &mut ShellContext) -> CommandResult {
    let backups = context.config_manager.list_backups()?;
    if backups.is_empty() {
        output::info("No configuration backups found.");
        return Ok(());
    }
    output::section("Configuration backups");
    for (idx, name) in backups.iter().enumerate() {
        output::plain(format!("{:>3}. {}", idx + 1, name));
    }
    Ok(())
}

fn handle_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(usage("config restore <number|name>"));
    };
    let name = match reference.parse::<usize>() {
        Ok(position) => context
            .config_manager
            .list_backups()?
            .into_iter()
            .nth(position.saturating_sub(1))
            .filter(|_| position > 0)
            .ok_or_else(|| {
                CommandError::InvalidArguments(format!("no configuration backup #{position}"))
            })?,
        Err(_) => (*reference).to_string(),
    };
    context.config = context.config_manager.restore(&name)?;
    output::set_color_enabled(context.config.ui_color_enabled);
    output::success(format!("Configuration restored from `{}`.", name));
    Ok(())
}
