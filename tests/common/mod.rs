use std::sync::Mutex;

use control_center::{
    config::ConfigManager,
    core::office_manager::OfficeManager,
    storage::{JsonOfficeStorage, StoragePaths},
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Keeps temp directories alive until the test binary exits.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Isolated office and config managers rooted in a fresh temp directory.
pub fn setup_test_env() -> (OfficeManager, ConfigManager) {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let paths = StoragePaths {
        office_root: base.join("offices"),
        backup_root: base.join("backups"),
    };
    let storage = JsonOfficeStorage::with_retention(paths, 3).expect("create json storage");
    let manager = OfficeManager::new(Box::new(storage));
    let config_manager = ConfigManager::with_base_dir(base).expect("create config manager");
    (manager, config_manager)
}
