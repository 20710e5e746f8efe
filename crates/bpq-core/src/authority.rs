//! External possession state
//!
//! The queue decides who *should* hold a blueprint; the item engine decides
//! who actually does. [`ResourceAuthority`] is the seam between the two.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::{HolderId, ResourceKey};

/// Query and revoke possession in the external item engine
pub trait ResourceAuthority {
    /// Whether `holder` is connected and can be acted on right now
    fn is_reachable(&self, holder: HolderId) -> bool;

    /// Whether `holder` currently possesses `key`
    fn possesses(&self, holder: HolderId, key: &ResourceKey) -> bool;

    /// Take `key` away from `holder`
    fn revoke(&mut self, holder: HolderId, key: &ResourceKey);
}

/// In-memory possession table.
///
/// Serves as the authority for tests and as the on-disk ledger format of the
/// CLI, which has no live item engine to talk to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PossessionLedger {
    #[serde(default)]
    online: BTreeSet<HolderId>,
    #[serde(default)]
    holdings: BTreeMap<HolderId, BTreeSet<ResourceKey>>,
    #[serde(skip)]
    revocations: Vec<(HolderId, ResourceKey)>,
}

impl PossessionLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a holder as connected
    pub fn connect(&mut self, holder: HolderId) {
        self.online.insert(holder);
    }

    /// Mark a holder as disconnected
    pub fn disconnect(&mut self, holder: HolderId) {
        self.online.remove(&holder);
    }

    /// Give `holder` the blueprint for `key`
    pub fn grant(&mut self, holder: HolderId, key: &ResourceKey) {
        self.holdings.entry(holder).or_default().insert(key.clone());
    }

    /// Connected holders, ascending
    #[must_use]
    pub fn online(&self) -> Vec<HolderId> {
        self.online.iter().copied().collect()
    }

    /// Blueprints held by `holder`
    #[must_use]
    pub fn holdings(&self, holder: HolderId) -> Vec<ResourceKey> {
        self.holdings
            .get(&holder)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Revocations applied since this ledger was created or loaded
    #[must_use]
    pub fn revocations(&self) -> &[(HolderId, ResourceKey)] {
        &self.revocations
    }
}

impl ResourceAuthority for PossessionLedger {
    fn is_reachable(&self, holder: HolderId) -> bool {
        self.online.contains(&holder)
    }

    fn possesses(&self, holder: HolderId, key: &ResourceKey) -> bool {
        self.holdings
            .get(&holder)
            .is_some_and(|keys| keys.contains(key))
    }

    fn revoke(&mut self, holder: HolderId, key: &ResourceKey) {
        let removed = self
            .holdings
            .get_mut(&holder)
            .is_some_and(|keys| keys.remove(key));
        if self.holdings.get(&holder).is_some_and(BTreeSet::is_empty) {
            self.holdings.remove(&holder);
        }
        if removed {
            self.revocations.push((holder, key.clone()));
        }
    }
}
