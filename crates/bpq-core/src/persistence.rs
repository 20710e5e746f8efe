//! Snapshot persistence for the queue store
//!
//! The in-memory [`QueueStore`] is the source of truth while running; the
//! snapshot is its durable mirror, written wholesale after every mutation and
//! read once at startup.
//!
//! On disk the snapshot is a JSON object mapping resource key to holder ids,
//! oldest first:
//!
//! ```json
//! { "rifle.ak": [76561198000000002, 76561198000000003], "smg.mp5": [] }
//! ```

use std::{
    cell::RefCell,
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    queue::{QueueStore, Snapshot},
    Result,
};

/// Durable storage for queue snapshots
pub trait SnapshotStore {
    /// Read the last saved snapshot, `None` if nothing was ever saved
    ///
    /// # Errors
    ///
    /// Returns an error if storage exists but cannot be read or decoded.
    fn load(&self) -> Result<Option<Snapshot>>;

    /// Replace the saved snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Snapshot kept in a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        // Write beside the target and rename so a crash never leaves a torn file
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, snapshot)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Snapshot kept in memory
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    saved: RefCell<Option<Snapshot>>,
    saves: RefCell<usize>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `snapshot`
    #[must_use]
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            saved: RefCell::new(Some(snapshot)),
            saves: RefCell::new(0),
        }
    }

    /// Last saved snapshot
    #[must_use]
    pub fn saved(&self) -> Option<Snapshot> {
        self.saved.borrow().clone()
    }

    /// How many times `save` was called
    #[must_use]
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        Ok(self.saved.borrow().clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        *self.saved.borrow_mut() = Some(snapshot.clone());
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}

/// Build the queue store from the saved snapshot.
///
/// Missing storage gives an empty store. Unreadable or corrupt storage also
/// gives an empty store, with a warning.
pub fn load_queue_store(snapshots: &dyn SnapshotStore) -> QueueStore {
    match snapshots.load() {
        Ok(Some(snapshot)) => {
            let store = QueueStore::from_snapshot(snapshot);
            tracing::debug!(queues = store.len(), "Loaded queue snapshot");
            store
        }
        Ok(None) => {
            tracing::debug!("No queue snapshot found, starting empty");
            QueueStore::new()
        }
        Err(e) => {
            tracing::warn!("Queue snapshot unreadable: {e}, starting empty");
            QueueStore::new()
        }
    }
}

/// Write the whole store
///
/// # Errors
///
/// Returns an error if the snapshot store rejects the write.
pub fn save_queue_store(store: &QueueStore, snapshots: &dyn SnapshotStore) -> Result<()> {
    snapshots.save(&store.to_snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{HolderId, ResourceKey};

    fn sample_store() -> Result<QueueStore> {
        let mut store = QueueStore::new();
        store.enqueue(&ResourceKey::new("rifle.ak"), HolderId::new(3))?;
        store.enqueue(&ResourceKey::new("rifle.ak"), HolderId::new(1))?;
        store.get_or_create(&ResourceKey::new("smg.mp5"));
        Ok(store)
    }

    #[test]
    fn test_file_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let snapshots = JsonFileSnapshotStore::new(dir.path().join("data").join("queues.json"));
        let store = sample_store()?;

        save_queue_store(&store, &snapshots)?;
        assert_eq!(load_queue_store(&snapshots), store);
        Ok(())
    }

    #[test]
    fn test_file_format() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let snapshots = JsonFileSnapshotStore::new(dir.path().join("queues.json"));
        save_queue_store(&sample_store()?, &snapshots)?;

        let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(snapshots.path())?)?;
        assert_eq!(
            raw,
            serde_json::json!({ "rifle.ak": [3, 1], "smg.mp5": [] })
        );
        Ok(())
    }

    #[test]
    fn test_missing_file_is_empty_store() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let snapshots = JsonFileSnapshotStore::new(dir.path().join("queues.json"));

        assert!(snapshots.load()?.is_none());
        assert!(load_queue_store(&snapshots).is_empty());
        Ok(())
    }

    #[test]
    fn test_corrupt_file_is_empty_store() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("queues.json");
        std::fs::write(&path, "{ \"rifle.ak\": [1, ")?;
        let snapshots = JsonFileSnapshotStore::new(&path);

        assert!(snapshots.load().is_err());
        assert!(load_queue_store(&snapshots).is_empty());
        Ok(())
    }

    #[test]
    fn test_memory_store_counts_saves() -> Result<()> {
        let snapshots = MemorySnapshotStore::new();
        let store = sample_store()?;
        save_queue_store(&store, &snapshots)?;
        save_queue_store(&store, &snapshots)?;

        assert_eq!(snapshots.save_count(), 2);
        assert_eq!(snapshots.saved(), Some(store.to_snapshot()));
        Ok(())
    }

    fn dedup_in_order(holders: Vec<u64>) -> Vec<HolderId> {
        let mut seen = std::collections::BTreeSet::new();
        holders
            .into_iter()
            .filter(|h| seen.insert(*h))
            .map(HolderId::new)
            .collect()
    }

    proptest::proptest! {
        #[test]
        fn prop_snapshot_round_trip(
            raw in proptest::collection::btree_map("[a-z]{1,6}\\.[a-z0-9]{1,4}", proptest::collection::vec(0u64..20, 0..6), 0..5)
        ) {
            let snapshot: Snapshot = raw
                .into_iter()
                .map(|(key, holders)| (ResourceKey::new(key.as_str()), dedup_in_order(holders)))
                .collect();
            let before = QueueStore::from_snapshot(snapshot.clone());
            let snapshots = MemorySnapshotStore::new();

            proptest::prop_assert!(save_queue_store(&before, &snapshots).is_ok());
            let after = load_queue_store(&snapshots);
            proptest::prop_assert_eq!(after.to_snapshot(), snapshot);
            proptest::prop_assert_eq!(after, before);
        }
    }
}
