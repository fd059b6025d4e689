use std::path::{Path, PathBuf};

use crate::cli::core::{usage, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};
use crate::core::office_manager::LoadMetadata;

const USAGE: &str = "office <new|load|save|list|backup|backups|restore>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "office",
        "Create, open, save and back up offices",
        "office | office new <name> | office load <name|path> | office save [name|path] | office list | office backup [note] | office backups [name] | office restore <number|id> [name]",
        cmd_office,
    )]
}

fn cmd_office(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((subcommand, rest)) = args.split_first() else {
        return handle_overview(context);
    };
    match subcommand.to_ascii_lowercase().as_str() {
        "new" => handle_new(context, rest),
        "load" => handle_load(context, rest),
        "save" => handle_save(context, rest),
        "list" => handle_list(context),
        "backup" => handle_backup(context, rest),
        "backups" => handle_list_backups(context, rest),
        "restore" => handle_restore(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown office subcommand `{}`; {}",
            other, USAGE
        ))),
    }
}

fn handle_overview(context: &mut ShellContext) -> CommandResult {
    let name = context.office_name().map(str::to_string);
    context.with_office(|office| {
        output::section(format!("Office: {}", office.name));
        output::plain(format!("  Stored as   : {}", name.as_deref().unwrap_or("-")));
        output::plain(format!("  Tasks       : {}", office.tasks.len()));
        output::plain(format!("  Cash flow   : {}", office.cash_flow.len()));
        output::plain(format!(
            "  Updated     : {}",
            office.updated_at.format("%Y-%m-%d %H:%M")
        ));
        Ok(())
    })
}

fn handle_new(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return Err(usage("office new <name>"));
    }
    let name = args.join(" ");
    context.manager.create(&name);
    context.remember_office(Some(&name))?;
    tracing::info!(office = %name, "office created");
    output::success(format!("New office `{}` created.", name));
    output::hint("Use `office save` to write it to disk.");
    Ok(())
}

fn handle_load(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [target] = args else {
        return Err(usage("office load <name|path>"));
    };
    let meta = if looks_like_path(target) {
        context.manager.load_from_path(Path::new(target))?
    } else {
        context.manager.load(target)?
    };
    if meta.name.is_some() {
        context.remember_office(meta.name.as_deref())?;
    }
    report_load(context, &meta);
    Ok(())
}

fn handle_save(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if context.manager.current().is_none() {
        return Err(CommandError::OfficeNotLoaded);
    }
    match args {
        [] => {
            context.manager.save()?;
        }
        [target] if looks_like_path(target) => {
            context.manager.save_to_path(&PathBuf::from(target))?;
        }
        [name] => {
            context.manager.save_as(name)?;
            context.remember_office(Some(*name))?;
        }
        _ => return Err(usage("office save [name|path]")),
    }
    let target = context
        .manager
        .current_name()
        .map(str::to_string)
        .or_else(|| {
            context
                .manager
                .current_path()
                .map(|path| path.display().to_string())
        })
        .unwrap_or_default();
    output::success(format!("Office saved to `{}`.", target));
    Ok(())
}

fn handle_list(context: &mut ShellContext) -> CommandResult {
    let names = context.manager.list_offices()?;
    if names.is_empty() {
        output::info("No saved offices yet.");
        return Ok(());
    }
    output::section("Saved offices");
    let active = context.office_name().unwrap_or_default();
    for name in names {
        let marker = if name.eq_ignore_ascii_case(active) {
            "*"
        } else {
            " "
        };
        output::plain(format!(" {marker} {name}"));
    }
    Ok(())
}

fn handle_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = (!args.is_empty()).then(|| args.join(" "));
    let info = context.manager.backup(note.as_deref())?;
    output::success(format!("Backup created: {}", info.id));
    Ok(())
}

fn handle_list_backups(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let backups = context.manager.list_backups(args.first().copied())?;
    if backups.is_empty() {
        output::info("No backups found.");
        return Ok(());
    }
    let mut table = Table::new(
        Some("Backups"),
        vec![
            TableColumn::numeric("#"),
            TableColumn::new("Created"),
            TableColumn::new("File"),
        ],
    );
    for (idx, backup) in backups.iter().enumerate() {
        table.add_row(vec![
            (idx + 1).to_string(),
            backup.created_at.clone(),
            backup.id.clone(),
        ]);
    }
    table.print();
    output::hint("Use `office restore <number>` to restore one.");
    Ok(())
}

fn handle_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (reference, name) = match args {
        [reference] => {
            let name = context
                .manager
                .current_name()
                .map(str::to_string)
                .ok_or_else(|| usage("office restore <number|id> <name>"))?;
            (*reference, name)
        }
        [reference, name] => (*reference, (*name).to_string()),
        _ => return Err(usage("office restore <number|id> [name]")),
    };
    let meta = context.manager.restore(&name, reference)?;
    context.remember_office(Some(&name))?;
    output::success(format!("Office `{}` restored from backup.", name));
    report_warnings(&meta);
    Ok(())
}

fn report_load(context: &ShellContext, meta: &LoadMetadata) {
    let label = meta
        .name
        .clone()
        .or_else(|| meta.path.as_ref().map(|path| path.display().to_string()))
        .unwrap_or_default();
    let counts = context
        .manager
        .current()
        .map(|office| {
            format!(
                " ({} tasks, {} cash flow entries)",
                office.tasks.len(),
                office.cash_flow.len()
            )
        })
        .unwrap_or_default();
    output::success(format!("Office `{}` loaded{}.", label, counts));
    report_warnings(meta);
}

fn report_warnings(meta: &LoadMetadata) {
    for warning in &meta.warnings {
        output::warning(warning);
    }
}

fn looks_like_path(value: &str) -> bool {
    value.contains(std::path::MAIN_SEPARATOR) || value.contains('/') || value.ends_with(".json")
}
