use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use explora_calendar::{
    Catalog, ConfiguredPermissions, Destination, LinkStore, LocalCalendar, ReminderSettings,
    ReminderSynchronizer,
};
use explora_core::Config;

/// Catalog shipped with the binary, used when the configured one is missing.
const BUNDLED_CATALOG: &str = include_str!("../data/destinations.json");

/// Wires configuration, catalog, local calendar and link store together.
pub struct App {
    catalog: Catalog,
    calendar: LocalCalendar,
    permissions: Arc<ConfiguredPermissions>,
    sync: ReminderSynchronizer,
}

impl App {
    pub fn new(config: Config, catalog_override: Option<&Path>) -> Result<Self> {
        let catalog = Self::load_catalog(&config, catalog_override)?;

        let calendar = LocalCalendar::open(&config.calendar.database)
            .with_context(|| format!("Failed to open calendar at {}", config.calendar.database))?;
        let store = LinkStore::open(&config.storage.links_db)
            .with_context(|| format!("Failed to open link store at {}", config.storage.links_db))?;
        let permissions = Arc::new(ConfiguredPermissions::from_config(&config.calendar));

        let sync = ReminderSynchronizer::new(
            permissions.clone(),
            Arc::new(calendar.clone()),
            Arc::new(store),
            ReminderSettings::from(&config.reminders),
        );

        tracing::info!(
            "Loaded {} destinations; calendar access is {:?}",
            catalog.len(),
            permissions.status()
        );

        Ok(Self {
            catalog,
            calendar,
            permissions,
            sync,
        })
    }

    fn load_catalog(config: &Config, catalog_override: Option<&Path>) -> Result<Catalog> {
        if let Some(path) = catalog_override {
            return Ok(Catalog::load(path)?);
        }

        let path = Path::new(&config.catalog.path);
        if path.exists() {
            Ok(Catalog::load(path)?)
        } else {
            tracing::warn!(
                "Catalog {} not found, using the bundled destinations",
                path.display()
            );
            Ok(Catalog::from_json(BUNDLED_CATALOG)?)
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn calendar(&self) -> &LocalCalendar {
        &self.calendar
    }

    pub fn permissions(&self) -> &ConfiguredPermissions {
        &self.permissions
    }

    pub fn sync(&self) -> &ReminderSynchronizer {
        &self.sync
    }

    pub fn destination(&self, name: &str) -> Result<&Destination> {
        self.catalog
            .find(name)
            .ok_or_else(|| explora_calendar::CalendarError::DestinationNotFound(name.to_string()))
            .map_err(anyhow::Error::from)
    }

    pub fn shutdown(self) -> Result<()> {
        tracing::info!("Shutting down");
        Ok(())
    }
}
