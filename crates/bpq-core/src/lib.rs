//! bpq-core - Capacity-limited blueprint queues
//!
//! This crate provides:
//! - The per-item FIFO queue store and its JSON snapshot
//! - Admission with oldest-first eviction
//! - Reconciliation of external possession against queue membership
//! - Configuration loading with a built-in default
//! - The trigger dispatcher tying it together

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod admission;
pub mod authority;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod ids;
pub mod persistence;
pub mod queue;
pub mod reconcile;

pub use admission::{AdmissionController, AdmitOutcome, Enforcement, Eviction, RevokeOutcome};
pub use authority::{PossessionLedger, ResourceAuthority};
pub use config::{load_config, write_default_config, CapacityProvider, Config, ConfigLoad, ItemLimit};
pub use engine::{Engine, Trigger, TriggerOutcome};
pub use error::{Error, Result};
pub use events::{Notification, NotificationKind, NotificationSink, RecordingSink};
pub use ids::{HolderId, ResourceKey};
pub use persistence::{
    load_queue_store, save_queue_store, JsonFileSnapshotStore, MemorySnapshotStore, SnapshotStore,
};
pub use queue::{Queue, QueueStore, Snapshot};
pub use reconcile::{ReconcileReport, ReconciliationScanner};
