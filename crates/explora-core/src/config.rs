use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lead time used when a reminder does not configure one (24 hours).
pub const DEFAULT_LEAD_TIME_MINUTES: u32 = 1440;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Destination catalog settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Local persisted state
    #[serde(default)]
    pub storage: StorageConfig,

    /// Calendar backend and access settings
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Reminder event settings
    #[serde(default)]
    pub reminders: ReminderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the destinations JSON file
    pub path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_config_dir()
                .join("destinations.json")
                .to_string_lossy()
                .into_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file holding the destination -> event id links
    pub links_db: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            links_db: default_data_dir()
                .join("travel-store.db")
                .to_string_lossy()
                .into_owned(),
        }
    }
}

/// Calendar access as seen by the desktop permission provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CalendarAccess {
    #[default]
    Granted,
    Limited,
    Denied,
    Blocked,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// SQLite file backing the local calendar
    pub database: String,

    /// Current access status reported to the synchronizer
    #[serde(default)]
    pub access: CalendarAccess,

    /// Whether a permission prompt from the `denied` state is accepted
    #[serde(default = "default_grant_on_request")]
    pub grant_on_request: bool,
}

fn default_grant_on_request() -> bool {
    true
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            database: default_data_dir()
                .join("calendar.db")
                .to_string_lossy()
                .into_owned(),
            access: CalendarAccess::default(),
            grant_on_request: default_grant_on_request(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Minutes before the trip starts at which the alarm fires
    #[serde(default = "default_lead_time")]
    pub lead_time_minutes: u32,

    /// Prefix for event titles ("Travel to Kyoto")
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,

    /// Append formatted coordinates to the event location
    #[serde(default = "default_include_coordinates")]
    pub include_coordinates: bool,
}

fn default_lead_time() -> u32 {
    DEFAULT_LEAD_TIME_MINUTES
}

fn default_title_prefix() -> String {
    "Travel to".to_string()
}

fn default_include_coordinates() -> bool {
    true
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            lead_time_minutes: default_lead_time(),
            title_prefix: default_title_prefix(),
            include_coordinates: default_include_coordinates(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("explora")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("explora")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            catalog: CatalogConfig::default(),
            storage: StorageConfig::default(),
            calendar: CalendarConfig::default(),
            reminders: ReminderConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file, writing defaults if it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            tracing::info!("Wrote default config to {}", config_path.display());
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails; warnings are logged.
    pub fn load_validated(config_path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match config_path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.reminders.lead_time_minutes == 0 {
            result.add_warning(
                "reminders.lead_time_minutes",
                "Reminder alarm fires at the start of the trip (0 minutes)",
            );
        } else if self.reminders.lead_time_minutes > 40320 {
            result.add_warning(
                "reminders.lead_time_minutes",
                "Reminder lead time is more than 4 weeks",
            );
        }

        if self.reminders.title_prefix.trim().is_empty() {
            result.add_error("reminders.title_prefix", "Event title prefix must not be empty");
        }

        if self.storage.links_db.trim().is_empty() {
            result.add_error("storage.links_db", "Link database path must not be empty");
        }

        if self.calendar.database.trim().is_empty() {
            result.add_error("calendar.database", "Calendar database path must not be empty");
        } else if self.calendar.database == self.storage.links_db {
            result.add_warning(
                "calendar.database",
                "Calendar and link store share one database file",
            );
        }

        let catalog_path = PathBuf::from(&self.catalog.path);
        if !catalog_path.exists() {
            result.add_warning(
                "catalog.path",
                format!("Catalog does not exist: {}", catalog_path.display()),
            );
        } else if !catalog_path.is_file() {
            result.add_error(
                "catalog.path",
                format!("Catalog is not a file: {}", catalog_path.display()),
            );
        }

        match self.calendar.access {
            CalendarAccess::Unavailable => result.add_warning(
                "calendar.access",
                "Calendar is unavailable; reminders cannot be created",
            ),
            CalendarAccess::Blocked => result.add_warning(
                "calendar.access",
                "Calendar access is blocked; reminders cannot be created",
            ),
            CalendarAccess::Granted | CalendarAccess::Limited | CalendarAccess::Denied => {}
        }

        result
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("explora");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert_eq!(config.reminders.lead_time_minutes, 1440);
        assert_eq!(config.reminders.title_prefix, "Travel to");
    }

    #[test]
    fn test_empty_title_prefix_is_error() {
        let mut config = Config::default();
        config.reminders.title_prefix = "   ".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "reminders.title_prefix"));
    }

    #[test]
    fn test_zero_lead_time_is_warning() {
        let mut config = Config::default();
        config.reminders.lead_time_minutes = 0;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "reminders.lead_time_minutes"));
    }

    #[test]
    fn test_blocked_access_is_warning() {
        let mut config = Config::default();
        config.calendar.access = CalendarAccess::Blocked;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "calendar.access"));
    }

    #[test]
    fn test_load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.calendar.access, CalendarAccess::Granted);
    }

    #[test]
    fn test_partial_file_fills_section_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
config_dir = "/tmp/explora"

[calendar]
database = "/tmp/explora/calendar.db"
access = "denied"
grant_on_request = false

[reminders]
lead_time_minutes = 60
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.calendar.access, CalendarAccess::Denied);
        assert!(!config.calendar.grant_on_request);
        assert_eq!(config.reminders.lead_time_minutes, 60);
        assert_eq!(config.reminders.title_prefix, "Travel to");
        assert!(config.reminders.include_coordinates);
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.reminders.title_prefix = "Trip to".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.reminders.title_prefix, "Trip to");
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
