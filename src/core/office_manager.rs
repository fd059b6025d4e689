use std::path::{Path, PathBuf};

use cc_core::{
    storage::{office_warnings, OfficeBackupInfo, OfficeStorage},
    CoreError,
};
use cc_domain::Office;

/// Metadata describing the outcome of a load operation.
#[derive(Debug, Clone)]
pub struct LoadMetadata {
    pub warnings: Vec<String>,
    pub path: Option<PathBuf>,
    pub name: Option<String>,
}

/// Facade that coordinates the active office, persistence, and backups.
pub struct OfficeManager {
    current: Option<Office>,
    current_name: Option<String>,
    current_path: Option<PathBuf>,
    storage: Box<dyn OfficeStorage>,
}

impl OfficeManager {
    pub fn new(storage: Box<dyn OfficeStorage>) -> Self {
        Self {
            current: None,
            current_name: None,
            current_path: None,
            storage,
        }
    }

    pub fn storage(&self) -> &dyn OfficeStorage {
        self.storage.as_ref()
    }

    pub fn current(&self) -> Option<&Office> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Office> {
        self.current.as_mut()
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current_name.as_deref()
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// Starts a fresh, unsaved office stored under `name`.
    pub fn create(&mut self, name: &str) -> &Office {
        self.current_name = Some(name.to_string());
        self.current_path = None;
        self.current.insert(Office::new(name))
    }

    pub fn load(&mut self, name: &str) -> Result<LoadMetadata, CoreError> {
        let office = self.storage.load_office(name)?;
        self.current_name = Some(name.to_string());
        self.current_path = None;
        Ok(self.apply_load(office))
    }

    pub fn load_from_path(&mut self, path: &Path) -> Result<LoadMetadata, CoreError> {
        let office = self.storage.load_office_from_path(path)?;
        self.current_name = None;
        self.current_path = Some(path.to_path_buf());
        Ok(self.apply_load(office))
    }

    /// Writes the active office back to wherever it came from.
    pub fn save(&mut self) -> Result<(), CoreError> {
        if let Some(name) = self.current_name.clone() {
            self.save_as(&name)
        } else if let Some(path) = self.current_path.clone() {
            self.save_to_path(&path)
        } else {
            Err(CoreError::InvalidOperation(
                "office has neither a name nor a path to save to".into(),
            ))
        }
    }

    pub fn save_as(&mut self, name: &str) -> Result<(), CoreError> {
        let office = self.require_current()?;
        self.storage.save_office(name, office)?;
        self.current_name = Some(name.to_string());
        self.current_path = None;
        Ok(())
    }

    pub fn save_to_path(&mut self, path: &Path) -> Result<(), CoreError> {
        let office = self.require_current()?;
        self.storage.save_office_to_path(office, path)?;
        self.current_path = Some(path.to_path_buf());
        Ok(())
    }

    pub fn list_offices(&self) -> Result<Vec<String>, CoreError> {
        self.storage.list_offices()
    }

    pub fn backup(&self, note: Option<&str>) -> Result<OfficeBackupInfo, CoreError> {
        let name = self.require_name()?;
        let office = self.require_current()?;
        self.storage.backup_office(name, office, note)
    }

    pub fn list_backups(&self, name: Option<&str>) -> Result<Vec<OfficeBackupInfo>, CoreError> {
        let name = match name {
            Some(name) => name,
            None => self.require_name()?,
        };
        self.storage.list_backups(name)
    }

    /// Restores a backup picked by its 1-based position in [`Self::list_backups`]
    /// or by a unique fragment of its id, and makes it the active office.
    pub fn restore(&mut self, name: &str, reference: &str) -> Result<LoadMetadata, CoreError> {
        let backups = self.storage.list_backups(name)?;
        let backup = resolve_backup(&backups, reference)?;
        let office = self.storage.restore_backup(backup)?;
        self.current_name = Some(name.to_string());
        self.current_path = None;
        Ok(self.apply_load(office))
    }

    fn apply_load(&mut self, office: Office) -> LoadMetadata {
        let warnings = office_warnings(&office);
        for warning in &warnings {
            tracing::warn!(office = %office.name, "{warning}");
        }
        self.current = Some(office);
        LoadMetadata {
            warnings,
            path: self.current_path.clone(),
            name: self.current_name.clone(),
        }
    }

    fn require_current(&self) -> Result<&Office, CoreError> {
        self.current
            .as_ref()
            .ok_or_else(|| CoreError::InvalidOperation("no office loaded".into()))
    }

    fn require_name(&self) -> Result<&str, CoreError> {
        self.current_name.as_deref().ok_or_else(|| {
            CoreError::InvalidOperation("the active office has no name; use `office save <name>`".into())
        })
    }
}

fn resolve_backup<'a>(
    backups: &'a [OfficeBackupInfo],
    reference: &str,
) -> Result<&'a OfficeBackupInfo, CoreError> {
    let reference = reference.trim();
    if let Ok(index) = reference.parse::<usize>() {
        if let Some(backup) = index.checked_sub(1).and_then(|idx| backups.get(idx)) {
            return Ok(backup);
        }
    }
    let matches: Vec<&OfficeBackupInfo> = backups
        .iter()
        .filter(|backup| backup.id.contains(reference))
        .collect();
    match matches.as_slice() {
        [single] => Ok(single),
        [] => Err(CoreError::InvalidOperation(format!(
            "no backup matches `{reference}`"
        ))),
        _ => Err(CoreError::InvalidOperation(format!(
            "`{reference}` matches several backups; be more specific"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_domain::Task;
    use cc_storage_json::{JsonOfficeStorage, StoragePaths};
    use chrono::Utc;
    use tempfile::TempDir;

    fn storage_at(dir: &TempDir) -> Box<JsonOfficeStorage> {
        Box::new(
            JsonOfficeStorage::new(StoragePaths {
                office_root: dir.path().join("offices"),
                backup_root: dir.path().join("backups"),
            })
            .unwrap(),
        )
    }

    fn manager() -> (OfficeManager, TempDir) {
        let dir = TempDir::new().unwrap();
        (OfficeManager::new(storage_at(&dir)), dir)
    }

    #[test]
    fn save_requires_an_office() {
        let (mut manager, _dir) = manager();
        assert!(matches!(manager.save(), Err(CoreError::InvalidOperation(_))));
    }

    #[test]
    fn created_office_saves_and_reloads_by_name() {
        let (mut manager, dir) = manager();
        manager.create("home");
        manager
            .current_mut()
            .unwrap()
            .add_task(Task::new("Renew passport", Utc::now()));
        manager.save().unwrap();

        let mut other = OfficeManager::new(storage_at(&dir));
        let meta = other.load("home").unwrap();
        assert!(meta.warnings.is_empty());
        assert_eq!(other.current().unwrap().tasks.len(), 1);
        assert_eq!(other.current_name(), Some("home"));
    }

    #[test]
    fn restore_accepts_list_position() {
        let (mut manager, _dir) = manager();
        manager.create("home");
        manager.save().unwrap();
        manager.backup(Some("empty")).unwrap();

        manager
            .current_mut()
            .unwrap()
            .add_task(Task::new("Call the bank", Utc::now()));
        manager.save().unwrap();

        manager.restore("home", "1").unwrap();
        assert!(manager.current().unwrap().tasks.is_empty());
        assert!(matches!(
            manager.restore("home", "nope"),
            Err(CoreError::InvalidOperation(_))
        ));
    }
}
