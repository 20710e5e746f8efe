//! On-disk state for the CLI
//!
//! Everything lives in one data directory:
//! - `config.toml` - managed items and their capacities
//! - `queues.json` - queue snapshot
//! - `ledger.json` - who is online and who holds which blueprint
//!
//! The ledger stands in for the game's item engine, which the CLI cannot
//! reach.

use std::{
    io::Write as _,
    path::{Path, PathBuf},
};

use bpq_core::{
    load_config, write_default_config, Config, Engine, JsonFileSnapshotStore, NotificationSink,
    PossessionLedger,
};

use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "config.toml";
pub const SNAPSHOT_FILE: &str = "queues.json";
pub const LEDGER_FILE: &str = "ledger.json";

/// Resolved data directory
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Explicit directory if given, otherwise the platform data directory
    ///
    /// # Errors
    ///
    /// Returns `Error::NoDataDir` if no explicit directory was given and the
    /// platform directory cannot be determined.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self::new(path));
        }
        directories::ProjectDirs::from("", "", "bpq")
            .map(|dirs| Self::new(dirs.data_dir()))
            .ok_or(Error::NoDataDir)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILE)
    }

    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(LEDGER_FILE)
    }

    /// Effective config, regenerating the file when it is missing or broken
    /// and `write_default` is set
    ///
    /// # Errors
    ///
    /// Returns an error only if regenerating the file fails.
    pub fn config(&self, write_default: bool) -> Result<Config> {
        let path = self.config_path();
        let load = load_config(&path);
        if write_default && load.needs_default() {
            tracing::warn!("Regenerating {}", path.display());
            return Ok(write_default_config(&path)?);
        }
        Ok(load.resolve())
    }

    /// Read the possession ledger; a missing file is an empty ledger
    ///
    /// # Errors
    ///
    /// Returns `Error::LedgerError` if the file exists but cannot be read or parsed.
    pub fn load_ledger(&self) -> Result<PossessionLedger> {
        let path = self.ledger_path();
        match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| Error::LedgerError {
                path,
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PossessionLedger::new()),
            Err(e) => Err(Error::LedgerError {
                path,
                message: e.to_string(),
            }),
        }
    }

    /// Write the possession ledger atomically
    ///
    /// # Errors
    ///
    /// Returns `Error::LedgerError` if the file cannot be written.
    pub fn save_ledger(&self, ledger: &PossessionLedger) -> Result<()> {
        let path = self.ledger_path();
        let to_ledger_error = |message: String| Error::LedgerError {
            path: path.clone(),
            message,
        };

        std::fs::create_dir_all(&self.root).map_err(|e| to_ledger_error(e.to_string()))?;
        let json = serde_json::to_vec_pretty(ledger).map_err(|e| to_ledger_error(e.to_string()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)
            .map_err(|e| to_ledger_error(e.to_string()))?;
        tmp.write_all(&json).map_err(|e| to_ledger_error(e.to_string()))?;
        tmp.persist(&path).map_err(|e| to_ledger_error(e.error.to_string()))?;
        Ok(())
    }

    /// Build an engine over this directory. No reconciliation is run.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read or the default config
    /// cannot be written.
    pub fn engine<N: NotificationSink>(
        &self,
        sink: N,
        write_default: bool,
    ) -> Result<Engine<PossessionLedger, N, JsonFileSnapshotStore>> {
        let config = self.config(write_default)?;
        let ledger = self.load_ledger()?;
        Ok(Engine::new(
            config,
            ledger,
            sink,
            JsonFileSnapshotStore::new(self.snapshot_path()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use bpq_core::{HolderId, ResourceAuthority, ResourceKey};

    use super::*;

    #[test]
    fn test_ledger_round_trip() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let data = DataDir::new(dir.path().join("bpq"));
        assert_eq!(data.load_ledger()?, PossessionLedger::new());

        let mut ledger = PossessionLedger::new();
        ledger.connect(HolderId::new(1));
        ledger.grant(HolderId::new(1), &ResourceKey::new("rifle.ak"));
        data.save_ledger(&ledger)?;

        let loaded = data.load_ledger()?;
        assert!(loaded.is_reachable(HolderId::new(1)));
        assert!(loaded.possesses(HolderId::new(1), &ResourceKey::new("rifle.ak")));
        Ok(())
    }

    #[test]
    fn test_corrupt_ledger_is_an_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let data = DataDir::new(dir.path());
        std::fs::write(data.ledger_path(), "{ nope")?;

        assert!(matches!(data.load_ledger(), Err(Error::LedgerError { .. })));
        Ok(())
    }

    #[test]
    fn test_config_regenerated_on_request() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let data = DataDir::new(dir.path());

        assert_eq!(data.config(false)?, Config::default());
        assert!(!data.config_path().exists());

        assert_eq!(data.config(true)?, Config::default());
        assert!(data.config_path().exists());
        Ok(())
    }
}
