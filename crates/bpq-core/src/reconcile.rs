//! Reconciliation: take blueprints from holders who have no queue slot
//!
//! Queue membership is authoritative. A holder who possesses a managed
//! blueprint without being queued for it (typically evicted while offline)
//! has the blueprint revoked. Membership is never derived from possession or
//! changed here; a scan only creates missing queues for configured keys.

use crate::{
    authority::ResourceAuthority,
    config::CapacityProvider,
    events::{Notification, NotificationKind, NotificationSink},
    ids::{HolderId, ResourceKey},
    queue::QueueStore,
};

/// Blueprints taken from one holder during a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub holder: HolderId,
    pub enforced: Vec<ResourceKey>,
}

impl ReconcileReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.enforced.is_empty()
    }
}

pub struct ReconciliationScanner<'a> {
    store: &'a mut QueueStore,
    capacities: &'a dyn CapacityProvider,
    authority: &'a mut dyn ResourceAuthority,
    sink: &'a mut dyn NotificationSink,
}

impl<'a> ReconciliationScanner<'a> {
    pub fn new(
        store: &'a mut QueueStore,
        capacities: &'a dyn CapacityProvider,
        authority: &'a mut dyn ResourceAuthority,
        sink: &'a mut dyn NotificationSink,
    ) -> Self {
        Self {
            store,
            capacities,
            authority,
            sink,
        }
    }

    /// Check every managed blueprint for one (re)connecting holder
    pub fn scan_participant(&mut self, holder: HolderId) -> ReconcileReport {
        let mut enforced = Vec::new();

        for key in self.capacities.resources() {
            let is_member = self.store.get_or_create(&key).contains(holder);
            if is_member || !self.authority.possesses(holder, &key) {
                continue;
            }

            self.authority.revoke(holder, &key);
            self.sink.notify(&Notification::new(
                holder,
                NotificationKind::LostByEnforcement,
                key.clone(),
            ));
            tracing::info!(key = %key, holder = %holder, "Revoked blueprint held without a queue slot");
            enforced.push(key);
        }

        ReconcileReport { holder, enforced }
    }

    /// Startup pass over every currently connected holder
    pub fn scan_all(&mut self, participants: &[HolderId]) -> Vec<ReconcileReport> {
        let reports: Vec<_> = participants
            .iter()
            .map(|holder| self.scan_participant(*holder))
            .collect();

        let enforced: usize = reports.iter().map(|r| r.enforced.len()).sum();
        tracing::info!(
            participants = participants.len(),
            enforced,
            "Startup reconciliation complete"
        );
        reports
    }
}
