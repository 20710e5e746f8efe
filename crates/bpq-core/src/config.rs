//! Configuration loading
//!
//! The set of managed blueprints and how many holders each may have at once.
//!
//! # Example Config
//!
//! ```toml
//! [[items]]
//! short_name = "rifle.ak"
//! max_learners = 2
//!
//! [[items]]
//! short_name = "smg.mp5"
//! max_learners = 3
//! ```
//!
//! Loading never fails outright: a missing, unreadable, malformed or empty
//! file resolves to [`Config::default`] with a warning.

use std::{collections::HashSet, num::NonZeroUsize, path::Path};

use serde::{Deserialize, Serialize};

use crate::{ids::ResourceKey, Error, Result};

/// Read-only view of per-resource capacity.
///
/// Implementations are queried on every operation; the engine never caches
/// the answer.
pub trait CapacityProvider {
    /// Capacity for `key`, or `None` if the key is not managed
    fn capacity(&self, key: &ResourceKey) -> Option<NonZeroUsize>;

    /// Every managed key, in configured order
    fn resources(&self) -> Vec<ResourceKey>;
}

/// Capacity limit for one item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemLimit {
    pub short_name: String,
    pub max_learners: usize,
}

impl ItemLimit {
    #[must_use]
    pub fn new(short_name: impl Into<String>, max_learners: usize) -> Self {
        Self {
            short_name: short_name.into(),
            max_learners,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub items: Vec<ItemLimit>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            items: vec![ItemLimit::new("rifle.ak", 2), ItemLimit::new("smg.mp5", 3)],
        }
    }
}

impl Config {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the TOML is malformed or fails
    /// [`Config::validate`].
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` if encoding fails.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the item list is usable
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if:
    /// - No items are configured
    /// - An item has a blank short name
    /// - An item has `max_learners = 0`
    /// - A short name appears more than once
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(Error::InvalidConfig("no items configured".to_string()));
        }

        let mut seen = HashSet::new();
        for item in &self.items {
            if item.short_name.trim().is_empty() {
                return Err(Error::InvalidConfig("item with blank short_name".to_string()));
            }
            if item.max_learners == 0 {
                return Err(Error::InvalidConfig(format!(
                    "max_learners for '{}' must be at least 1",
                    item.short_name
                )));
            }
            if !seen.insert(item.short_name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "'{}' is configured more than once",
                    item.short_name
                )));
            }
        }
        Ok(())
    }

    /// Check whether `key` is a managed item
    #[must_use]
    pub fn is_configured(&self, key: &ResourceKey) -> bool {
        self.capacity(key).is_some()
    }
}

impl CapacityProvider for Config {
    fn capacity(&self, key: &ResourceKey) -> Option<NonZeroUsize> {
        self.items
            .iter()
            .find(|i| i.short_name == key.as_str())
            .and_then(|i| NonZeroUsize::new(i.max_learners))
    }

    fn resources(&self) -> Vec<ResourceKey> {
        self.items
            .iter()
            .map(|i| ResourceKey::new(i.short_name.as_str()))
            .collect()
    }
}

/// Result of reading the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLoad {
    /// File read and validated
    Loaded(Config),
    /// No file at the given path
    Missing,
    /// File present but unusable
    Invalid(String),
}

impl ConfigLoad {
    /// The loaded config, or the built-in default with a warning
    #[must_use]
    pub fn resolve(self) -> Config {
        match self {
            Self::Loaded(config) => config,
            Self::Missing => {
                tracing::warn!("No config file found, using default config");
                Config::default()
            }
            Self::Invalid(reason) => {
                tracing::warn!("Config error: {reason}, using default config");
                Config::default()
            }
        }
    }

    /// Whether the default will be substituted
    #[must_use]
    pub const fn needs_default(&self) -> bool {
        !matches!(self, Self::Loaded(_))
    }
}

/// Read and validate the config file at `path`
pub fn load_config(path: &Path) -> ConfigLoad {
    match std::fs::read_to_string(path) {
        Ok(content) => match Config::from_toml(&content) {
            Ok(config) => ConfigLoad::Loaded(config),
            Err(e) => ConfigLoad::Invalid(e.to_string()),
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ConfigLoad::Missing,
        Err(e) => ConfigLoad::Invalid(format!("failed to read {}: {e}", path.display())),
    }
}

/// Write the built-in default config to `path`, creating parent directories
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_default_config(path: &Path) -> Result<Config> {
    let config = Config::default();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, config.to_toml()?)?;
    tracing::info!(path = %path.display(), "Default config generated");
    Ok(config)
}
