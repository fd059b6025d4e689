use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use cc_core::{
    storage::{office_warnings, OfficeBackupInfo, OfficeStorage},
    CoreError,
};
use cc_domain::{Office, CURRENT_SCHEMA_VERSION};
use chrono::{DateTime, NaiveDateTime, Utc};

const OFFICE_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
pub const DEFAULT_RETENTION: usize = 5;

/// Directories the JSON backend reads and writes.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub office_root: PathBuf,
    pub backup_root: PathBuf,
}

/// Filesystem-backed JSON persistence for offices and their backups.
#[derive(Debug, Clone)]
pub struct JsonOfficeStorage {
    offices_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonOfficeStorage {
    pub fn new(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.office_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            offices_dir: paths.office_root,
            backups_dir: paths.backup_root,
            retention: retention.max(1),
        })
    }

    pub fn office_path(&self, name: &str) -> PathBuf {
        self.offices_dir
            .join(format!("{}.{}", canonical_name(name), OFFICE_EXTENSION))
    }

    pub fn backup_path(&self, name: &str, backup: &str) -> PathBuf {
        self.backup_dir(name).join(backup)
    }

    pub fn list_office_metadata(&self) -> Result<Vec<OfficeMetadata>, CoreError> {
        let mut entries = Vec::new();
        for slug in self.list_offices()? {
            let office = self.load_office(&slug)?;
            entries.push(OfficeMetadata {
                path: self.office_path(&slug),
                slug,
                name: office.name.clone(),
                created_at: office.created_at,
                updated_at: office.updated_at,
                task_count: office.tasks.len(),
                open_task_count: office.tasks.iter().filter(|t| !t.is_complete()).count(),
                recurring_task_count: office
                    .tasks
                    .iter()
                    .filter(|t| t.recurrence.is_some())
                    .count(),
                cash_flow_count: office.cash_flow.len(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    pub fn list_backup_metadata(&self, name: &str) -> Result<Vec<BackupMetadata>, CoreError> {
        let mut rows = Vec::new();
        for entry in self.list_backups(name)? {
            let size_bytes = fs::metadata(&entry.path)
                .map(|meta| meta.len())
                .unwrap_or(0);
            rows.push(BackupMetadata {
                created_at: parse_backup_timestamp(&entry.id),
                name: entry.id,
                size_bytes,
                path: entry.path,
            });
        }
        rows.sort_by_key(|meta| Reverse(meta.created_at));
        Ok(rows)
    }

    pub fn delete_backup(&self, name: &str, backup_id: &str) -> Result<(), CoreError> {
        let path = self.backup_path(name, backup_id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.backups_dir
            .join(format!("{}-backups", canonical_name(name)))
    }

    fn write_backup_file(
        &self,
        office: &Office,
        name: &str,
        note: Option<&str>,
    ) -> Result<OfficeBackupInfo, CoreError> {
        let dir = self.backup_dir(name);
        fs::create_dir_all(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{}_{}", canonical_name(name), timestamp);
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let file_name = format!("{}.{}", stem, OFFICE_EXTENSION);
        let path = dir.join(&file_name);
        let tmp = tmp_path(&path);
        write_file(&tmp, &serialize_office(office)?)?;
        fs::rename(&tmp, &path)?;
        self.prune_backups(name)?;
        tracing::info!(office = %canonical_name(name), backup = %file_name, "backup written");
        Ok(OfficeBackupInfo {
            office: canonical_name(name),
            id: file_name,
            created_at: timestamp,
            path,
        })
    }

    fn backup_existing_file(&self, name: &str, path: &Path) -> Result<(), CoreError> {
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir(name);
        fs::create_dir_all(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let file_name = format!(
            "{}_{}.{}",
            canonical_name(name),
            timestamp,
            OFFICE_EXTENSION
        );
        fs::copy(path, dir.join(&file_name))?;
        self.prune_backups(name)?;
        tracing::debug!(office = %canonical_name(name), backup = %file_name, "previous save backed up");
        Ok(())
    }

    fn prune_backups(&self, name: &str) -> Result<(), CoreError> {
        let entries = self.list_backups(name)?;
        for entry in entries.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&entry.path) {
                tracing::warn!(backup = %entry.id, error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl OfficeStorage for JsonOfficeStorage {
    fn save_office(&self, name: &str, office: &Office) -> Result<(), CoreError> {
        let path = self.office_path(name);
        if path.exists() {
            self.backup_existing_file(name, &path)?;
        }
        save_office_to_path(office, &path)
    }

    fn load_office(&self, name: &str) -> Result<Office, CoreError> {
        let path = self.office_path(name);
        if !path.exists() {
            return Err(CoreError::OfficeNotFound(name.to_string()));
        }
        load_office_from_path(&path)
    }

    fn list_offices(&self) -> Result<Vec<String>, CoreError> {
        if !self.offices_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.offices_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(OFFICE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete_office(&self, name: &str) -> Result<(), CoreError> {
        let path = self.office_path(name);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn save_office_to_path(&self, office: &Office, path: &Path) -> Result<(), CoreError> {
        if path.starts_with(&self.offices_dir) {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                self.backup_existing_file(stem, path)?;
            }
        }
        save_office_to_path(office, path)
    }

    fn load_office_from_path(&self, path: &Path) -> Result<Office, CoreError> {
        load_office_from_path(path)
    }

    fn backup_office(
        &self,
        name: &str,
        office: &Office,
        note: Option<&str>,
    ) -> Result<OfficeBackupInfo, CoreError> {
        self.write_backup_file(office, name, note)
    }

    fn list_backups(&self, name: &str) -> Result<Vec<OfficeBackupInfo>, CoreError> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let slug = canonical_name(name);
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(OFFICE_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(OfficeBackupInfo {
                    office: slug.clone(),
                    id: file_name.to_string(),
                    created_at: parse_backup_timestamp(file_name)
                        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_default(),
                    path: path.clone(),
                });
            }
        }
        entries.sort_by(|a, b| {
            parse_backup_timestamp(&b.id)
                .cmp(&parse_backup_timestamp(&a.id))
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(entries)
    }

    fn restore_backup(&self, backup: &OfficeBackupInfo) -> Result<Office, CoreError> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.id
            )));
        }
        let office = load_office_from_path(&backup.path)?;
        let target = self.office_path(&backup.office);
        self.backup_existing_file(&backup.office, &target)?;
        save_office_to_path(&office, &target)?;
        tracing::info!(office = %backup.office, backup = %backup.id, "backup restored");
        Ok(office)
    }
}

/// Saves an office to an arbitrary path on disk via a temporary file.
pub fn save_office_to_path(office: &Office, path: &Path) -> Result<(), CoreError> {
    let tmp = tmp_path(path);
    write_file(&tmp, &serialize_office(office)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads an office from the provided filesystem path.
///
/// Files written by a newer schema are refused; consistency problems are logged.
pub fn load_office_from_path(path: &Path) -> Result<Office, CoreError> {
    let data = fs::read_to_string(path)?;
    let office: Office =
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
    if office.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(CoreError::Storage(format!(
            "office `{}` uses schema version {} (supported: {})",
            office.name, office.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }
    for warning in office_warnings(&office) {
        tracing::warn!(office = %office.name, "{warning}");
    }
    Ok(office)
}

#[derive(Debug, Clone)]
pub struct OfficeMetadata {
    pub slug: String,
    pub name: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub task_count: usize,
    pub open_task_count: usize,
    pub recurring_task_count: usize,
    pub cash_flow_count: usize,
}

#[derive(Debug, Clone)]
pub struct BackupMetadata {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "office".into()
    } else {
        sanitized
    }
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Reads the `<date>_<time>` pair that follows the office slug in a backup name.
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(&format!(".{}", OFFICE_EXTENSION))?;
    let segments: Vec<&str> = stem.split('_').collect();
    segments.windows(2).rev().find_map(|pair| {
        let (date, time) = (pair[0], pair[1]);
        if !is_digits(date, 8) || !is_digits(time, 6) {
            return None;
        }
        NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S")
            .ok()
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
    })
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_file(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

fn serialize_office(office: &Office) -> Result<String, CoreError> {
    serde_json::to_string_pretty(office).map_err(|err| CoreError::Serde(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_notes_are_slugged() {
        assert_eq!(
            sanitize_backup_note(Some("  Before Q1 close. ")),
            Some("before-q1-close".into())
        );
        assert_eq!(sanitize_backup_note(Some("!!!")), None);
        assert_eq!(sanitize_backup_note(None), None);
    }

    #[test]
    fn timestamps_parse_with_and_without_notes() {
        let plain = parse_backup_timestamp("family_office_20260301_093015.json");
        let noted = parse_backup_timestamp("family_office_20260301_093015_pre-import.json");
        assert!(plain.is_some());
        assert_eq!(plain, noted);
        assert!(parse_backup_timestamp("family_office.json").is_none());
    }

    #[test]
    fn canonical_names_fall_back_for_symbols() {
        assert_eq!(canonical_name("Family Office"), "family_office");
        assert_eq!(canonical_name("***"), "office");
    }
}
