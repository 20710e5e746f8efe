//! Notifications emitted to holders

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{HolderId, ResourceKey};

/// What happened to a holder's place in a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Holder was given a slot
    Admitted,
    /// Holder was taken out of the queue on request
    RemovedFromQueue,
    /// Holder was evicted to make room and lost the blueprint
    LostByRotation,
    /// Holder had the blueprint without a slot and lost it
    LostByEnforcement,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", s.trim_matches('"'))
    }
}

/// A message addressed to one holder about one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub holder: HolderId,
    pub kind: NotificationKind,
    pub key: ResourceKey,
    pub at: DateTime<Utc>,
}

impl Notification {
    #[must_use]
    pub fn new(holder: HolderId, kind: NotificationKind, key: ResourceKey) -> Self {
        Self {
            holder,
            kind,
            key,
            at: Utc::now(),
        }
    }
}

/// Delivery of notifications to holders
pub trait NotificationSink {
    fn notify(&mut self, notification: &Notification);
}

/// Sink that keeps every notification in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    notifications: Vec<Notification>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far, in order
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// `(holder, kind, key)` triples, for compact assertions
    #[must_use]
    pub fn summary(&self) -> Vec<(HolderId, NotificationKind, ResourceKey)> {
        self.notifications
            .iter()
            .map(|n| (n.holder, n.kind, n.key.clone()))
            .collect()
    }

    /// Remove and return everything received so far
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&mut self, notification: &Notification) {
        self.notifications.push(notification.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display_is_snake_case() {
        assert_eq!(NotificationKind::Admitted.to_string(), "admitted");
        assert_eq!(NotificationKind::RemovedFromQueue.to_string(), "removed_from_queue");
        assert_eq!(NotificationKind::LostByRotation.to_string(), "lost_by_rotation");
        assert_eq!(NotificationKind::LostByEnforcement.to_string(), "lost_by_enforcement");
    }

    #[test]
    fn test_recording_sink_drain() {
        let mut sink = RecordingSink::new();
        sink.notify(&Notification::new(
            HolderId::new(1),
            NotificationKind::Admitted,
            ResourceKey::new("rifle.ak"),
        ));

        assert_eq!(sink.summary().len(), 1);
        assert_eq!(sink.drain().len(), 1);
        assert!(sink.notifications().is_empty());
    }
}
