//! On-disk home of the preferences file and its timestamped backups.

use std::{
    fmt, fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{Config, ConfigError};

const BACKUP_PREFIX: &str = "config_";
const BACKUP_SUFFIX: &str = ".json";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
/// Width of a formatted `STAMP_FORMAT` value.
const STAMP_LEN: usize = 15;

/// Reads, writes and snapshots a [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
    backups_dir: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf, backups_dir: PathBuf) -> Self {
        Self {
            config_path,
            backups_dir,
        }
    }

    /// Lays out `<base>/config/config.json` and `<base>/config/backups`.
    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        let root = base.join("config");
        let manager = Self::new(root.join("config.json"), root.join("backups"));
        fs::create_dir_all(&manager.backups_dir)?;
        Ok(manager)
    }

    /// The saved configuration, or defaults when nothing was saved yet.
    pub fn load(&self) -> Result<Config, ConfigError> {
        match fs::read_to_string(&self.config_path) {
            Ok(text) => decode(&text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        persist(&self.config_path, config)
    }

    /// Snapshots `config` under the current time; returns the file name.
    pub fn backup(&self, config: &Config, note: Option<&str>) -> Result<String, ConfigError> {
        self.backup_at(config, note, Utc::now())
    }

    pub fn backup_at(
        &self,
        config: &Config,
        note: Option<&str>,
        taken_at: DateTime<Utc>,
    ) -> Result<String, ConfigError> {
        let name = BackupName::new(taken_at, note).to_string();
        persist(&self.backups_dir.join(&name), config)?;
        Ok(name)
    }

    /// Makes the named backup the active configuration.
    pub fn restore(&self, backup_name: &str) -> Result<Config, ConfigError> {
        let text = match fs::read_to_string(self.backups_dir.join(backup_name)) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::BackupNotFound(backup_name.to_string()))
            }
            Err(err) => return Err(err.into()),
        };
        let config = decode(&text)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Backup file names, newest first. Files not named like a backup are skipped.
    pub fn list_backups(&self) -> Result<Vec<String>, ConfigError> {
        let dir = match fs::read_dir(&self.backups_dir) {
            Ok(dir) => dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut backups = Vec::new();
        for entry in dir {
            let file_name = entry?.file_name();
            if let Some(parsed) = file_name.to_str().and_then(BackupName::parse) {
                backups.push(parsed);
            }
        }
        backups.sort_by(|a, b| b.cmp(a));
        Ok(backups.iter().map(BackupName::to_string).collect())
    }
}

/// `config_<YYYYmmdd_HHMMSS>[_<label>].json`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct BackupName {
    taken_at: NaiveDateTime,
    label: Option<String>,
}

impl BackupName {
    fn new(taken_at: DateTime<Utc>, note: Option<&str>) -> Self {
        Self {
            taken_at: taken_at.naive_utc(),
            label: note.and_then(slug),
        }
    }

    fn parse(file_name: &str) -> Option<Self> {
        let body = file_name
            .strip_prefix(BACKUP_PREFIX)?
            .strip_suffix(BACKUP_SUFFIX)?;
        let taken_at = NaiveDateTime::parse_from_str(body.get(..STAMP_LEN)?, STAMP_FORMAT).ok()?;
        let label = match body.get(STAMP_LEN..)? {
            "" => None,
            rest => Some(rest.strip_prefix('_')?.to_string()),
        };
        Some(Self { taken_at, label })
    }
}

impl fmt::Display for BackupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{BACKUP_PREFIX}{}", self.taken_at.format(STAMP_FORMAT))?;
        if let Some(label) = &self.label {
            write!(f, "_{label}")?;
        }
        f.write_str(BACKUP_SUFFIX)
    }
}

/// Lowercase ASCII words of `note` joined by dashes.
fn slug(note: &str) -> Option<String> {
    let words: Vec<String> = note
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    (!words.is_empty()).then(|| words.join("-"))
}

fn decode(text: &str) -> Result<Config, ConfigError> {
    serde_json::from_str(text).map_err(|err| ConfigError::Serde(err.to_string()))
}

/// Writes through a sibling staging file so readers never see a partial file.
fn persist(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let staging = path.with_extension("json.tmp");
    let mut writer = BufWriter::new(fs::File::create(&staging)?);
    serde_json::to_writer_pretty(&mut writer, config)
        .map_err(|err| ConfigError::Serde(err.to_string()))?;
    writer.flush()?;
    drop(writer);
    fs::rename(&staging, path)?;
    Ok(())
}
