//! Admission controller: admit, evict and revoke against the queue store
//!
//! # Algorithm
//!
//! Admitting a holder into a full queue evicts the longest-resident member.
//! The evicted holder loses the blueprint immediately if they are connected
//! and still have it. If they are offline the eviction still stands and the
//! blueprint is taken on their next connection by the
//! [`ReconciliationScanner`](crate::reconcile::ReconciliationScanner).
//!
//! # Invariants
//!
//! - A holder appears at most once per queue.
//! - After every completed operation `len(queue) <= capacity(key)`.
//! - Every mutating operation ends with a full snapshot save.

use crate::{
    authority::ResourceAuthority,
    config::CapacityProvider,
    events::{Notification, NotificationKind, NotificationSink},
    ids::{HolderId, ResourceKey},
    persistence::{save_queue_store, SnapshotStore},
    queue::QueueStore,
    Result,
};

/// How an eviction was carried out on the external side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enforcement {
    /// Blueprint taken away and holder notified
    Revoked,
    /// Holder no longer had the blueprint, nothing to take
    AlreadyLost,
    /// Holder offline; revocation left to reconciliation
    Deferred,
}

/// A holder displaced by an admission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eviction {
    pub victim: HolderId,
    pub enforcement: Enforcement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// Holder appended; `evicted` lists displaced holders, oldest first
    Admitted { evicted: Vec<Eviction> },
    /// Holder was already queued, nothing changed
    AlreadyAdmitted,
    /// Key is not a managed item, nothing changed
    NotConfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// Holder taken out of the queue
    Removed,
    /// Holder was not queued, nothing changed
    NotQueued,
    /// Key is not a managed item, nothing changed
    NotConfigured,
}

/// Admit/revoke operations over one queue store.
///
/// Holds the store mutably for its whole lifetime, so each operation is
/// indivisible from the point of view of every other caller.
pub struct AdmissionController<'a> {
    store: &'a mut QueueStore,
    capacities: &'a dyn CapacityProvider,
    authority: &'a mut dyn ResourceAuthority,
    sink: &'a mut dyn NotificationSink,
    snapshots: &'a dyn SnapshotStore,
}

impl<'a> AdmissionController<'a> {
    pub fn new(
        store: &'a mut QueueStore,
        capacities: &'a dyn CapacityProvider,
        authority: &'a mut dyn ResourceAuthority,
        sink: &'a mut dyn NotificationSink,
        snapshots: &'a dyn SnapshotStore,
    ) -> Self {
        Self {
            store,
            capacities,
            authority,
            sink,
            snapshots,
        }
    }

    /// Give `holder` a slot in the queue for `key`, evicting as needed
    ///
    /// # Errors
    ///
    /// Returns an error only on a broken queue contract (an empty queue
    /// reported as full, or a duplicate enqueue). A failed snapshot save is
    /// logged and does not fail the admission.
    pub fn try_admit(&mut self, key: &ResourceKey, holder: HolderId) -> Result<AdmitOutcome> {
        let Some(capacity) = self.capacities.capacity(key) else {
            tracing::debug!(key = %key, holder = %holder, "Ignoring admission for unmanaged item");
            return Ok(AdmitOutcome::NotConfigured);
        };

        if self.store.contains(key, holder) {
            tracing::debug!(key = %key, holder = %holder, "Holder already queued");
            return Ok(AdmitOutcome::AlreadyAdmitted);
        }

        let mut evicted = Vec::new();
        while self.store.get_or_create(key).len() >= capacity.get() {
            let victim = self.store.dequeue_oldest(key)?;
            evicted.push(self.enforce_eviction(key, victim));
        }

        self.store.enqueue(key, holder)?;
        tracing::info!(key = %key, holder = %holder, evicted = evicted.len(), "Holder admitted");
        self.sink
            .notify(&Notification::new(holder, NotificationKind::Admitted, key.clone()));

        self.persist();
        Ok(AdmitOutcome::Admitted { evicted })
    }

    /// Take `holder` out of the queue for `key`
    pub fn revoke(&mut self, key: &ResourceKey, holder: HolderId) -> RevokeOutcome {
        if self.capacities.capacity(key).is_none() {
            tracing::debug!(key = %key, holder = %holder, "Ignoring revoke for unmanaged item");
            return RevokeOutcome::NotConfigured;
        }

        if !self.store.remove(key, holder) {
            return RevokeOutcome::NotQueued;
        }

        tracing::info!(key = %key, holder = %holder, "Holder removed from queue");
        self.sink.notify(&Notification::new(
            holder,
            NotificationKind::RemovedFromQueue,
            key.clone(),
        ));
        self.persist();
        RevokeOutcome::Removed
    }

    fn enforce_eviction(&mut self, key: &ResourceKey, victim: HolderId) -> Eviction {
        let enforcement = if !self.authority.is_reachable(victim) {
            tracing::info!(key = %key, holder = %victim, "Evicted offline holder, revocation deferred");
            Enforcement::Deferred
        } else if self.authority.possesses(victim, key) {
            self.authority.revoke(victim, key);
            self.sink.notify(&Notification::new(
                victim,
                NotificationKind::LostByRotation,
                key.clone(),
            ));
            tracing::info!(key = %key, holder = %victim, "Evicted holder, blueprint revoked");
            Enforcement::Revoked
        } else {
            tracing::debug!(key = %key, holder = %victim, "Evicted holder no longer had blueprint");
            Enforcement::AlreadyLost
        };
        Eviction {
            victim,
            enforcement,
        }
    }

    fn persist(&self) {
        if let Err(e) = save_queue_store(&*self.store, self.snapshots) {
            tracing::error!("Failed to save queue snapshot: {e}");
        }
    }
}
