//! Queue store: per-resource FIFO membership
//!
//! Each resource key owns one [`Queue`] of holders, oldest first. Queues are
//! created lazily and never deleted for the lifetime of the store.

use std::collections::{BTreeMap, VecDeque};

use crate::{
    ids::{HolderId, ResourceKey},
    Error, Result,
};

/// Durable form of the queue store: resource key to holders, oldest first
pub type Snapshot = BTreeMap<ResourceKey, Vec<HolderId>>;

/// Ordered membership of one resource, oldest holder at the head
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Queue {
    holders: VecDeque<HolderId>,
}

impl Queue {
    /// Create a new empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of holders in the queue
    #[must_use]
    pub fn len(&self) -> usize {
        self.holders.len()
    }

    /// Check if the queue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    /// Check whether a holder is a member
    #[must_use]
    pub fn contains(&self, holder: HolderId) -> bool {
        self.holders.contains(&holder)
    }

    /// Holders in arrival order
    pub fn iter(&self) -> impl Iterator<Item = HolderId> + '_ {
        self.holders.iter().copied()
    }

    fn push(&mut self, holder: HolderId) {
        self.holders.push_back(holder);
    }

    fn pop_oldest(&mut self) -> Option<HolderId> {
        self.holders.pop_front()
    }

    fn remove(&mut self, holder: HolderId) -> bool {
        self.holders
            .iter()
            .position(|h| *h == holder)
            .and_then(|i| self.holders.remove(i))
            .is_some()
    }
}

impl FromIterator<HolderId> for Queue {
    fn from_iter<I: IntoIterator<Item = HolderId>>(iter: I) -> Self {
        Self {
            holders: iter.into_iter().collect(),
        }
    }
}

/// All queues, keyed by resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStore {
    queues: BTreeMap<ResourceKey, Queue>,
}

impl QueueStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from its durable form.
    ///
    /// A holder listed twice for the same key keeps its first position.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let queues = snapshot
            .into_iter()
            .map(|(key, holders)| {
                let mut queue = Queue::new();
                for holder in holders {
                    if queue.contains(holder) {
                        tracing::warn!(key = %key, holder = %holder, "Dropping duplicate holder from snapshot");
                    } else {
                        queue.push(holder);
                    }
                }
                (key, queue)
            })
            .collect();
        Self { queues }
    }

    /// Durable form of the store. Empty queues are kept as empty lists.
    #[must_use]
    pub fn to_snapshot(&self) -> Snapshot {
        self.queues
            .iter()
            .map(|(key, queue)| (key.clone(), queue.iter().collect()))
            .collect()
    }

    /// Number of queues known to the store
    #[must_use]
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// Check if no queue has been created yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Look up a queue without creating it
    #[must_use]
    pub fn get(&self, key: &ResourceKey) -> Option<&Queue> {
        self.queues.get(key)
    }

    /// All queues in key order
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceKey, &Queue)> {
        self.queues.iter()
    }

    /// Return the queue for `key`, creating an empty one if absent
    pub fn get_or_create(&mut self, key: &ResourceKey) -> &mut Queue {
        self.queues.entry(key.clone()).or_default()
    }

    /// Check whether `holder` is queued for `key`
    #[must_use]
    pub fn contains(&self, key: &ResourceKey, holder: HolderId) -> bool {
        self.queues.get(key).is_some_and(|q| q.contains(holder))
    }

    /// Append `holder` at the tail of the queue for `key`
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateHolder` if the holder is already queued; the
    /// queue is left unchanged.
    pub fn enqueue(&mut self, key: &ResourceKey, holder: HolderId) -> Result<()> {
        let queue = self.get_or_create(key);
        if queue.contains(holder) {
            return Err(Error::DuplicateHolder {
                key: key.clone(),
                holder,
            });
        }
        queue.push(holder);
        Ok(())
    }

    /// Remove and return the longest-resident holder for `key`
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyQueue` if the queue has no members.
    pub fn dequeue_oldest(&mut self, key: &ResourceKey) -> Result<HolderId> {
        self.get_or_create(key)
            .pop_oldest()
            .ok_or_else(|| Error::EmptyQueue(key.clone()))
    }

    /// Remove `holder` from anywhere in the queue for `key`, keeping the
    /// relative order of the rest. Returns whether the queue changed.
    pub fn remove(&mut self, key: &ResourceKey, holder: HolderId) -> bool {
        self.get_or_create(key).remove(holder)
    }
}
