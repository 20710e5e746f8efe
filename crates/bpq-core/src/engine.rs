//! Trigger dispatch
//!
//! [`Engine`] owns the queue store and every collaborator, and is the only
//! entry point for host events. Each trigger runs to completion under
//! `&mut self`, so triggers are applied one at a time in the order the host
//! delivers them. Hosts that receive events on several threads must put the
//! engine behind a single lock or feed it from a single consumer.

use serde::{Deserialize, Serialize};

use crate::{
    admission::{AdmissionController, AdmitOutcome, RevokeOutcome},
    authority::ResourceAuthority,
    config::Config,
    events::NotificationSink,
    ids::{HolderId, ResourceKey},
    persistence::{load_queue_store, save_queue_store, SnapshotStore},
    queue::QueueStore,
    reconcile::{ReconcileReport, ReconciliationScanner},
    Result,
};

/// Host event the engine reacts to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Trigger {
    /// Holder joined or rejoined
    ParticipantConnected { holder: HolderId },
    /// Holder studied a blueprint in game
    ResourceAcquired { holder: HolderId, key: ResourceKey },
    /// Administrative admission
    ManualAdmit { holder: HolderId, key: ResourceKey },
    /// Administrative removal
    ManualRevoke { holder: HolderId, key: ResourceKey },
    /// Periodic save requested by the host
    Checkpoint,
    /// Host is going away
    Shutdown,
}

/// What a trigger did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    Reconciled(ReconcileReport),
    Admit(AdmitOutcome),
    Revoke(RevokeOutcome),
    /// `ResourceAcquired` for an item that is not managed
    Ignored,
    Saved,
    /// Operation abandoned; state is as it was before the failing step
    Failed(String),
}

pub struct Engine<A, N, S> {
    store: QueueStore,
    config: Config,
    authority: A,
    sink: N,
    snapshots: S,
}

impl<A, N, S> Engine<A, N, S>
where
    A: ResourceAuthority,
    N: NotificationSink,
    S: SnapshotStore,
{
    /// Load the saved queues; no reconciliation is run
    pub fn new(config: Config, authority: A, sink: N, snapshots: S) -> Self {
        let store = load_queue_store(&snapshots);
        Self {
            store,
            config,
            authority,
            sink,
            snapshots,
        }
    }

    /// Load the saved queues, then reconcile every holder in `online`
    pub fn start(config: Config, authority: A, sink: N, snapshots: S, online: &[HolderId]) -> Self {
        let mut engine = Self::new(config, authority, sink, snapshots);
        engine.reconcile_all(online);
        engine
    }

    #[must_use]
    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn authority(&self) -> &A {
        &self.authority
    }

    pub fn authority_mut(&mut self) -> &mut A {
        &mut self.authority
    }

    #[must_use]
    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut N {
        &mut self.sink
    }

    /// Apply one host event. Never fails; errors are logged and reported as
    /// [`TriggerOutcome::Failed`].
    pub fn handle(&mut self, trigger: &Trigger) -> TriggerOutcome {
        tracing::debug!(?trigger, "Handling trigger");
        match trigger {
            Trigger::ParticipantConnected { holder } => {
                TriggerOutcome::Reconciled(self.reconcile(*holder))
            }
            Trigger::ResourceAcquired { holder, key } => {
                if self.config.is_configured(key) {
                    self.admit(key, *holder)
                        .map_or_else(Self::failed, TriggerOutcome::Admit)
                } else {
                    TriggerOutcome::Ignored
                }
            }
            Trigger::ManualAdmit { holder, key } => self
                .admit(key, *holder)
                .map_or_else(Self::failed, TriggerOutcome::Admit),
            Trigger::ManualRevoke { holder, key } => TriggerOutcome::Revoke(self.revoke(key, *holder)),
            Trigger::Checkpoint | Trigger::Shutdown => self
                .save()
                .map_or_else(Self::failed, |()| TriggerOutcome::Saved),
        }
    }

    /// Admit `holder` to the queue for `key`
    ///
    /// # Errors
    ///
    /// Returns an error if a queue contract is broken mid-operation.
    pub fn admit(&mut self, key: &ResourceKey, holder: HolderId) -> Result<AdmitOutcome> {
        self.controller().try_admit(key, holder)
    }

    /// Remove `holder` from the queue for `key`
    pub fn revoke(&mut self, key: &ResourceKey, holder: HolderId) -> RevokeOutcome {
        self.controller().revoke(key, holder)
    }

    /// Reconcile one (re)connecting holder
    pub fn reconcile(&mut self, holder: HolderId) -> ReconcileReport {
        self.scanner().scan_participant(holder)
    }

    /// Reconcile every holder in `online`
    pub fn reconcile_all(&mut self, online: &[HolderId]) -> Vec<ReconcileReport> {
        self.scanner().scan_all(online)
    }

    /// Write the whole store
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot store rejects the write.
    pub fn save(&self) -> Result<()> {
        save_queue_store(&self.store, &self.snapshots)?;
        tracing::debug!(queues = self.store.len(), "Queue snapshot saved");
        Ok(())
    }

    /// Flush, then tear down, handing back the collaborators
    ///
    /// # Errors
    ///
    /// Returns an error if the final save fails; the engine is dropped either way.
    pub fn shutdown(self) -> Result<(A, N, S)> {
        self.save()?;
        Ok((self.authority, self.sink, self.snapshots))
    }

    fn controller(&mut self) -> AdmissionController<'_> {
        AdmissionController::new(
            &mut self.store,
            &self.config,
            &mut self.authority,
            &mut self.sink,
            &self.snapshots,
        )
    }

    fn scanner(&mut self) -> ReconciliationScanner<'_> {
        ReconciliationScanner::new(
            &mut self.store,
            &self.config,
            &mut self.authority,
            &mut self.sink,
        )
    }

    fn failed(err: crate::Error) -> TriggerOutcome {
        tracing::error!("Trigger failed: {err}");
        TriggerOutcome::Failed(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::{
        admission::{Enforcement, Eviction},
        authority::PossessionLedger,
        events::{NotificationKind, RecordingSink},
        persistence::{JsonFileSnapshotStore, MemorySnapshotStore},
        queue::Snapshot,
    };

    type TestEngine = Engine<PossessionLedger, RecordingSink, MemorySnapshotStore>;

    fn h(id: u64) -> HolderId {
        HolderId::new(id)
    }

    fn ak() -> ResourceKey {
        ResourceKey::new("rifle.ak")
    }

    fn engine() -> TestEngine {
        Engine::new(
            Config::default(),
            PossessionLedger::new(),
            RecordingSink::new(),
            MemorySnapshotStore::new(),
        )
    }

    /// Connected holder studies the AK blueprint
    fn study(engine: &mut TestEngine, id: u64) -> TriggerOutcome {
        engine.authority_mut().connect(h(id));
        engine.authority_mut().grant(h(id), &ak());
        engine.handle(&Trigger::ResourceAcquired {
            holder: h(id),
            key: ak(),
        })
    }

    fn queue(engine: &TestEngine) -> Vec<HolderId> {
        engine
            .store()
            .get(&ak())
            .map(|q| q.iter().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_trigger_json_shape() -> serde_json::Result<()> {
        let trigger: Trigger =
            serde_json::from_str(r#"{"event":"resource_acquired","holder":7,"key":"rifle.ak"}"#)?;
        assert_eq!(
            trigger,
            Trigger::ResourceAcquired {
                holder: h(7),
                key: ak(),
            }
        );
        let checkpoint: Trigger = serde_json::from_str(r#"{"event":"checkpoint"}"#)?;
        assert_eq!(checkpoint, Trigger::Checkpoint);
        Ok(())
    }

    // capacity 2, admit A B C -> [B, C], A loses by rotation
    #[test]
    fn scenario_rotation() {
        let mut engine = engine();
        study(&mut engine, 1);
        study(&mut engine, 2);
        let outcome = study(&mut engine, 3);

        assert_eq!(queue(&engine), vec![h(2), h(3)]);
        assert_eq!(
            outcome,
            TriggerOutcome::Admit(AdmitOutcome::Admitted {
                evicted: vec![Eviction {
                    victim: h(1),
                    enforcement: Enforcement::Revoked,
                }],
            })
        );
        assert!(engine
            .sink()
            .summary()
            .contains(&(h(1), NotificationKind::LostByRotation, ak())));
    }

    // admit A twice -> AlreadyAdmitted, queue [A]
    #[test]
    fn scenario_idempotent_admission() {
        let mut engine = engine();
        study(&mut engine, 1);
        let second = engine.handle(&Trigger::ManualAdmit {
            holder: h(1),
            key: ak(),
        });

        assert_eq!(second, TriggerOutcome::Admit(AdmitOutcome::AlreadyAdmitted));
        assert_eq!(queue(&engine), vec![h(1)]);
    }

    // revoke B from [B, C] -> [C], B notified
    #[test]
    fn scenario_manual_revoke() {
        let mut engine = engine();
        for id in [1, 2, 3] {
            study(&mut engine, id);
        }
        engine.sink_mut().drain();

        let outcome = engine.handle(&Trigger::ManualRevoke {
            holder: h(2),
            key: ak(),
        });
        assert_eq!(outcome, TriggerOutcome::Revoke(RevokeOutcome::Removed));
        assert_eq!(queue(&engine), vec![h(3)]);
        assert_eq!(
            engine.sink().summary(),
            vec![(h(2), NotificationKind::RemovedFromQueue, ak())]
        );
    }

    // save {"rifle.ak": [C]}, restart, load -> [C]
    #[test]
    fn scenario_restart_restores_queue() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("queues.json");

        let mut engine = Engine::new(
            Config::default(),
            PossessionLedger::new(),
            RecordingSink::new(),
            JsonFileSnapshotStore::new(&path),
        );
        engine.admit(&ak(), h(3))?;
        assert_eq!(engine.handle(&Trigger::Shutdown), TriggerOutcome::Saved);
        engine.shutdown()?;

        let restarted = Engine::new(
            Config::default(),
            PossessionLedger::new(),
            RecordingSink::new(),
            JsonFileSnapshotStore::new(&path),
        );
        assert_eq!(
            restarted.store().get(&ak()).map(|q| q.iter().collect::<Vec<_>>()),
            Some(vec![h(3)])
        );
        Ok(())
    }

    // D holds the AK but is not queued behind [C] -> revoked on connect
    #[test]
    fn scenario_enforcement_on_connect() -> Result<()> {
        let mut engine = engine();
        engine.admit(&ak(), h(3))?;
        engine.authority_mut().connect(h(4));
        engine.authority_mut().grant(h(4), &ak());
        engine.sink_mut().drain();

        let outcome = engine.handle(&Trigger::ParticipantConnected { holder: h(4) });

        assert!(matches!(
            outcome,
            TriggerOutcome::Reconciled(ref report) if report.enforced == vec![ak()]
        ));
        assert_eq!(engine.authority().revocations(), &[(h(4), ak())]);
        assert_eq!(
            engine.sink().summary(),
            vec![(h(4), NotificationKind::LostByEnforcement, ak())]
        );
        assert_eq!(queue(&engine), vec![h(3)]);
        Ok(())
    }

    // E evicted while offline keeps the blueprint until reconnecting
    #[test]
    fn scenario_offline_eviction_is_enforced_later() {
        let mut engine = engine();
        study(&mut engine, 5);
        engine.authority_mut().disconnect(h(5));
        study(&mut engine, 6);
        study(&mut engine, 7);

        assert_eq!(queue(&engine), vec![h(6), h(7)]);
        assert!(engine.authority().possesses(h(5), &ak()));
        assert!(engine.authority().revocations().is_empty());

        engine.authority_mut().connect(h(5));
        engine.handle(&Trigger::ParticipantConnected { holder: h(5) });

        assert!(!engine.authority().possesses(h(5), &ak()));
        assert_eq!(engine.authority().revocations(), &[(h(5), ak())]);
        let lost: Vec<_> = engine
            .sink()
            .summary()
            .into_iter()
            .filter(|(holder, _, _)| *holder == h(5))
            .map(|(_, kind, _)| kind)
            .collect();
        assert_eq!(
            lost,
            vec![NotificationKind::Admitted, NotificationKind::LostByEnforcement]
        );
    }

    #[test]
    fn test_unmanaged_acquisition_ignored() {
        let mut engine = engine();
        let outcome = engine.handle(&Trigger::ResourceAcquired {
            holder: h(1),
            key: ResourceKey::new("pistol.m92"),
        });

        assert_eq!(outcome, TriggerOutcome::Ignored);
        assert!(engine.store().is_empty());
    }

    #[test]
    fn test_manual_request_for_unmanaged_item() {
        let mut engine = engine();
        let key = ResourceKey::new("pistol.m92");

        assert_eq!(
            engine.handle(&Trigger::ManualAdmit { holder: h(1), key: key.clone() }),
            TriggerOutcome::Admit(AdmitOutcome::NotConfigured)
        );
        assert_eq!(
            engine.handle(&Trigger::ManualRevoke { holder: h(1), key }),
            TriggerOutcome::Revoke(RevokeOutcome::NotConfigured)
        );
    }

    #[test]
    fn test_start_runs_startup_reconciliation() {
        let mut saved = Snapshot::new();
        saved.insert(ak(), vec![h(1)]);
        let mut ledger = PossessionLedger::new();
        for id in [1, 2] {
            ledger.connect(h(id));
            ledger.grant(h(id), &ak());
        }
        let online = ledger.online();

        let engine = Engine::start(
            Config::default(),
            ledger,
            RecordingSink::new(),
            MemorySnapshotStore::with_snapshot(saved),
            &online,
        );

        assert!(engine.authority().possesses(h(1), &ak()));
        assert!(!engine.authority().possesses(h(2), &ak()));
        assert_eq!(
            engine.sink().summary(),
            vec![(h(2), NotificationKind::LostByEnforcement, ak())]
        );
    }

    #[test]
    fn test_checkpoint_saves_settled_state() {
        let mut engine = engine();
        study(&mut engine, 1);
        assert_eq!(engine.handle(&Trigger::Checkpoint), TriggerOutcome::Saved);

        let (_, _, snapshots) = engine.shutdown().unwrap();
        assert_eq!(
            snapshots.saved().and_then(|s| s.get(&ak()).cloned()),
            Some(vec![h(1)])
        );
        assert_eq!(snapshots.save_count(), 3);
    }
}
