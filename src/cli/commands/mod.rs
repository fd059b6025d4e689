pub mod cashflow;
pub mod config;
pub mod dashboard;
pub mod office;
pub mod recurrence;
pub mod system;
pub mod task;

use crate::cli::registry::{CommandEntry, CommandRegistry};

const ROOT_COMMAND_ORDER: &[&str] = &[
    "office",
    "task",
    "cashflow",
    "dashboard",
    "next",
    "preview",
    "config",
    "help",
    "version",
    "exit",
];

pub(crate) fn all_entries() -> Vec<CommandEntry> {
    let mut commands = Vec::new();
    commands.extend(office::definitions());
    commands.extend(task::definitions());
    commands.extend(cashflow::definitions());
    commands.extend(dashboard::definitions());
    commands.extend(recurrence::definitions());
    commands.extend(config::definitions());
    commands.extend(system::definitions());
    commands
}

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    let mut entries = all_entries();
    entries.sort_by_key(|entry| {
        ROOT_COMMAND_ORDER
            .iter()
            .position(|name| entry.name.eq_ignore_ascii_case(name))
            .unwrap_or(ROOT_COMMAND_ORDER.len())
    });
    for entry in entries {
        registry.register(entry);
    }
}
