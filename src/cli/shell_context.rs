//! Shared runtime state for CLI interactions and command execution.

use std::sync::Arc;

use cc_config::{Config, ConfigManager};
use cc_core::Clock;
use cc_storage_json::{JsonOfficeStorage, StoragePaths};

use crate::core::{
    errors::CliError,
    office_manager::OfficeManager,
    paths::{app_data_dir, storage_paths},
};

use super::{
    commands, output,
    registry::{CommandEntry, CommandRegistry},
    system_clock::SystemClock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub manager: OfficeManager,
    pub clock: Arc<dyn Clock>,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(app_data_dir())?;
        let config = config_manager.load()?;
        let paths = storage_paths(&config);
        Self::with_components(mode, config_manager, config, paths, Arc::new(SystemClock))
    }

    /// Builds a context from explicit parts; tests use this with a fixed clock.
    pub fn with_components(
        mode: CliMode,
        config_manager: ConfigManager,
        config: Config,
        paths: StoragePaths,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        output::set_color_enabled(config.ui_color_enabled);
        let storage = JsonOfficeStorage::with_retention(paths, config.backup_retention)?;

        let mut context = ShellContext {
            mode,
            registry,
            manager: OfficeManager::new(Box::new(storage)),
            clock,
            config_manager,
            config,
            last_command: None,
            running: true,
        };
        context.auto_load_last();
        Ok(context)
    }

    pub fn mode(&self) -> CliMode {
        self.mode
    }

    pub fn office_name(&self) -> Option<&str> {
        self.manager
            .current_name()
            .or_else(|| self.manager.current().map(|office| office.name.as_str()))
    }

    pub fn prompt(&self) -> String {
        match self.office_name() {
            Some(name) => format!("control-center [{name}]> "),
            None => "control-center> ".into(),
        }
    }

    pub fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    fn auto_load_last(&mut self) {
        if self.mode != CliMode::Interactive {
            return;
        }
        let Some(name) = self.config.last_opened_office.clone() else {
            return;
        };
        match self.manager.load(&name) {
            Ok(meta) => {
                for warning in &meta.warnings {
                    output::warning(warning);
                }
                output::success(format!("Automatically loaded last office `{}`.", name));
            }
            Err(err) => {
                tracing::warn!(office = %name, error = %err, "could not reopen last office");
            }
        }
    }
}
