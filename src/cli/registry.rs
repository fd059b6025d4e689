//! Lookup table from command words to their handlers.

use strsim::levenshtein;

use crate::cli::core::CommandResult;
use crate::cli::shell_context::ShellContext;

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

/// Largest edit distance still offered as a "did you mean" suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// One top-level command. `usage` lists alternative forms separated by ` | `.
pub struct CommandEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }

    pub fn usage_forms(&self) -> impl Iterator<Item = &'static str> {
        self.usage.split(" | ").map(str::trim)
    }
}

/// Commands in registration order. Lookups ignore ASCII case.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry`, replacing an earlier command of the same name.
    pub fn register(&mut self, entry: CommandEntry) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.name.eq_ignore_ascii_case(entry.name))
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    pub fn list(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    pub fn handler(&self, name: &str) -> Option<CommandHandler> {
        self.get(name).map(|entry| entry.handler)
    }

    /// Closest command name to a mistyped word, if any is near enough.
    pub fn closest(&self, input: &str) -> Option<&'static str> {
        let lowered = input.to_lowercase();
        self.names()
            .map(|name| (levenshtein(name, &lowered), name))
            .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, name)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut ShellContext, _: &[&str]) -> CommandResult {
        Ok(())
    }

    #[test]
    fn lookups_ignore_case_and_suggest_near_misses() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandEntry::new("dashboard", "", "dashboard", noop));
        registry.register(CommandEntry::new("task", "", "task add | task list", noop));
        assert!(registry.get("TASK").is_some());
        assert_eq!(registry.closest("dashbord"), Some("dashboard"));
        assert_eq!(registry.closest("zzzzzzzz"), None);
        let forms: Vec<_> = registry.get("task").unwrap().usage_forms().collect();
        assert_eq!(forms, vec!["task add", "task list"]);
    }
}
