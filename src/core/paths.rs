use std::{env, path::PathBuf};

use cc_config::Config;
use cc_storage_json::StoragePaths;
use dirs::home_dir;

/// Overrides the base directory for config, offices and backups.
pub const HOME_ENV: &str = "CONTROL_CENTER_HOME";

const DEFAULT_DIR_NAME: &str = ".control_center";
const OFFICE_DIR: &str = "offices";
const BACKUP_DIR: &str = "backups";

/// Returns the application-specific data directory, defaulting to `~/.control_center`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Resolves where offices and their backups live.
///
/// Explicit config roots win. Otherwise an overridden home keeps everything
/// under that directory, and a normal run uses the documents folder.
pub fn storage_paths(config: &Config) -> StoragePaths {
    let sandboxed = env::var_os(HOME_ENV).is_some();
    let office_root = match (&config.default_office_root, sandboxed) {
        (Some(path), _) => path.clone(),
        (None, true) => app_data_dir().join(OFFICE_DIR),
        (None, false) => config.resolve_default_office_root(),
    };
    let backup_root = match (&config.default_backup_root, sandboxed) {
        (Some(path), _) => path.clone(),
        (None, true) => app_data_dir().join(BACKUP_DIR),
        (None, false) => config.resolve_default_backup_root(),
    };
    StoragePaths {
        office_root,
        backup_root,
    }
}
