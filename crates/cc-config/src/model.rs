use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ConfigError;

/// Keys accepted by [`Config::set`] and shown by [`Config::entries`].
pub const CONFIG_KEYS: [&str; 9] = [
    "locale",
    "currency",
    "color",
    "office_root",
    "backup_root",
    "backup_retention",
    "upcoming_days",
    "deadline_days",
    "last_office",
];

/// Stores user-configurable CLI preferences and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened_office: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for offices. Defaults to `~/Documents/ControlCenter`.
    pub default_office_root: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for backups. Defaults to `~/Documents/ControlCenter/backups`.
    pub default_backup_root: Option<PathBuf>,

    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    #[serde(default = "Config::default_upcoming_window_days")]
    pub upcoming_window_days: u32,
    #[serde(default = "Config::default_deadline_horizon_days")]
    pub deadline_horizon_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            currency: "USD".into(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            last_opened_office: None,
            default_office_root: None,
            default_backup_root: None,
            backup_retention: Self::default_backup_retention(),
            upcoming_window_days: Self::default_upcoming_window_days(),
            deadline_horizon_days: Self::default_deadline_horizon_days(),
        }
    }
}

impl Config {
    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn default_upcoming_window_days() -> u32 {
        14
    }

    pub fn default_deadline_horizon_days() -> u32 {
        30
    }

    pub fn resolve_default_office_root(&self) -> PathBuf {
        if let Some(path) = &self.default_office_root {
            return path.clone();
        }
        documents_base().join("ControlCenter")
    }

    pub fn resolve_default_backup_root(&self) -> PathBuf {
        if let Some(path) = &self.default_backup_root {
            return path.clone();
        }
        documents_base().join("ControlCenter").join("backups")
    }

    /// Current value of every setting as `(key, value)` pairs.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let optional = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".into());
        vec![
            ("locale", self.locale.clone()),
            ("currency", self.currency.clone()),
            ("color", on_off(self.ui_color_enabled).into()),
            (
                "office_root",
                self.resolve_default_office_root().display().to_string(),
            ),
            (
                "backup_root",
                self.resolve_default_backup_root().display().to_string(),
            ),
            ("backup_retention", self.backup_retention.to_string()),
            ("upcoming_days", self.upcoming_window_days.to_string()),
            ("deadline_days", self.deadline_horizon_days.to_string()),
            ("last_office", optional(&self.last_opened_office)),
        ]
    }

    /// Updates one setting from user text. `default` resets path settings.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "locale" => self.locale = non_empty(key, value)?,
            "currency" => self.currency = non_empty(key, value)?.to_ascii_uppercase(),
            "color" => self.ui_color_enabled = parse_flag(key, value)?,
            "office_root" => self.default_office_root = optional_path(value),
            "backup_root" => self.default_backup_root = optional_path(value),
            "backup_retention" => self.backup_retention = parse_positive(key, value)? as usize,
            "upcoming_days" => self.upcoming_window_days = parse_positive(key, value)?,
            "deadline_days" => self.deadline_horizon_days = parse_positive(key, value)?,
            "last_office" => {
                self.last_opened_office = (!value.is_empty()).then(|| value.to_string())
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

fn documents_base() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn non_empty(key: &str, value: &str) -> Result<String, ConfigError> {
    if value.is_empty() {
        return Err(invalid(key, value, "value cannot be empty"));
    }
    Ok(value.to_string())
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(invalid(key, value, "expected on or off")),
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u32, ConfigError> {
    match value.parse::<u32>() {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(invalid(key, value, "expected a positive whole number")),
    }
}

fn optional_path(value: &str) -> Option<PathBuf> {
    if value.is_empty() || value.eq_ignore_ascii_case("default") {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_updates_typed_fields() {
        let mut config = Config::default();
        config.set("upcoming_days", "7").unwrap();
        config.set("color", "off").unwrap();
        config.set("currency", "eur").unwrap();
        assert_eq!(config.upcoming_window_days, 7);
        assert!(!config.ui_color_enabled);
        assert_eq!(config.currency, "EUR");
    }

    #[test]
    fn set_rejects_bad_input() {
        let mut config = Config::default();
        assert!(matches!(
            config.set("deadline_days", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.set("theme", "dark"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn path_settings_reset_to_default() {
        let mut config = Config::default();
        config.set("office_root", "/tmp/offices").unwrap();
        assert_eq!(config.resolve_default_office_root(), PathBuf::from("/tmp/offices"));
        config.set("office_root", "default").unwrap();
        assert!(config.default_office_root.is_none());
    }

    #[test]
    fn entries_cover_every_key() {
        let keys: Vec<_> = Config::default().entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, CONFIG_KEYS.to_vec());
    }
}
