//! Cache Item Module
//!
//! Defines the record stored for each key: its value, its ordering attributes
//! and its current position in each heap.

use std::time::{Duration, Instant};

// == Cache Item ==
/// A single cache entry with priority, access and expiry metadata.
#[derive(Debug, Clone)]
pub struct Item<V> {
    /// Key this item is stored under; never changes after creation
    pub(crate) key: String,
    /// The stored value
    pub(crate) value: V,
    /// Lower priorities are evicted first under capacity pressure
    pub(crate) priority: i64,
    /// Creation or last successful read/write
    pub(crate) access: Instant,
    /// Instant at which the item becomes dead
    pub(crate) expire: Instant,
    /// Slot in the priority heap, `None` once popped
    pub(crate) priority_index: Option<usize>,
    /// Slot in the expiry heap, `None` once popped
    pub(crate) expiry_index: Option<usize>,
}

impl<V> Item<V> {
    // == Constructor ==
    /// Creates an item accessed at `now` that expires `ttl` later.
    ///
    /// The item is not yet in either heap.
    pub fn new(key: String, value: V, priority: i64, now: Instant, ttl: Duration) -> Self {
        Self {
            key,
            value,
            priority,
            access: now,
            expire: now + ttl,
            priority_index: None,
            expiry_index: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    #[cfg(test)]
    pub fn value(&self) -> &V {
        &self.value
    }

    #[cfg(test)]
    pub fn priority(&self) -> i64 {
        self.priority
    }

    // == Is Expired ==
    /// Checks whether the item is dead at `now`.
    ///
    /// An item is expired once `now` reaches its expiry instant, so a zero TTL
    /// yields an item that is expired from the moment it is created.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expire <= now
    }

    /// Returns true while the item still sits in at least one heap.
    pub(crate) fn is_indexed(&self) -> bool {
        self.priority_index.is_some() || self.expiry_index.is_some()
    }
}
