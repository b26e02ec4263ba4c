//! Cache Store Module
//!
//! Main cache engine: a key table plus an expiry heap and a priority heap over
//! the same arena of items.
//!
//! Removing a key only touches the table. Heap entries whose item is no longer
//! the one the table maps its key to are stale; they are skipped and released
//! when popped during eviction, and swept in bulk once a heap holds more than
//! twice the live entries. This avoids a positional removal from the other heap
//! on every eviction at the cost of some heap slack.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{
    CacheStats, Clock, ExpiryOrder, IndexedHeap, Item, ItemArena, ItemId, PriorityOrder,
    SystemClock, MAX_TTL, STALE_SLACK,
};

// == Priority Cache ==
/// In-memory cache evicting expired items first, then lowest priority,
/// then least recently used.
#[derive(Debug)]
pub struct PriorityCache<V = i64> {
    /// Key to the single live item for that key
    table: HashMap<String, ItemId>,
    /// Storage for live and stale items
    arena: ItemArena<V>,
    /// Lowest priority, then oldest access, on top
    priority_heap: IndexedHeap<PriorityOrder>,
    /// Soonest expiry on top
    expiry_heap: IndexedHeap<ExpiryOrder>,
    /// Performance statistics
    stats: CacheStats,
    /// Capacity bound
    max_items: usize,
    clock: Arc<dyn Clock>,
}

impl<V> PriorityCache<V> {
    // == Constructor ==
    /// Creates a cache holding at most `max_items` entries, timed by the system clock.
    pub fn new(max_items: usize) -> Self {
        Self::with_clock(max_items, Arc::new(SystemClock))
    }

    /// Creates a cache that reads the current time from `clock`.
    pub fn with_clock(max_items: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            table: HashMap::new(),
            arena: ItemArena::new(),
            priority_heap: IndexedHeap::new(),
            expiry_heap: IndexedHeap::new(),
            stats: CacheStats::new(),
            max_items,
            clock,
        }
    }

    // == Set ==
    /// Stores `value` under `key` with the given priority and time-to-live.
    ///
    /// An existing item is updated in place and repositioned in both heaps.
    /// Afterwards entries are evicted until the cache fits its capacity.
    pub fn set(&mut self, key: impl Into<String>, value: V, priority: i64, ttl: Duration) {
        let key = key.into();
        let now = self.clock.now();
        let ttl = ttl.min(MAX_TTL);

        if let Some(&id) = self.table.get(&key) {
            let expire = now + ttl;
            let item = &mut self.arena[id];
            item.value = value;
            item.priority = priority;
            item.access = now;
            let expire_changed = item.expire != expire;
            item.expire = expire;

            self.priority_heap.fix(&mut self.arena, id);
            if expire_changed {
                self.expiry_heap.fix(&mut self.arena, id);
            }
        } else {
            let id = self
                .arena
                .insert(Item::new(key.clone(), value, priority, now, ttl));
            self.table.insert(key, id);
            self.priority_heap.push(&mut self.arena, id);
            self.expiry_heap.push(&mut self.arena, id);
        }

        self.evict_items();
    }

    // == Set Max Items ==
    /// Changes the capacity, evicting entries if the cache no longer fits.
    ///
    /// Capacity is unsigned; callers holding a signed bound clamp negatives to
    /// zero, which empties the cache.
    pub fn set_max_items(&mut self, max_items: usize) {
        self.max_items = max_items;
        self.evict_items();
    }

    // == Remove ==
    /// Removes `key` from the cache. Returns false if it was not present.
    pub fn remove(&mut self, key: &str) -> bool {
        if self.table.remove(key).is_none() {
            return false;
        }
        self.compact_if_stale();
        true
    }

    // == Purge Expired ==
    /// Removes every expired entry regardless of capacity.
    ///
    /// Stale entries met at the top of the expiry heap are released on the way.
    /// Returns the number of expired entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;

        while let Some(id) = self.expiry_heap.peek() {
            if self.is_live(id) {
                if !self.arena[id].is_expired(now) {
                    break;
                }
                self.table.remove(self.arena[id].key());
                self.stats.record_expiration();
                removed += 1;
            }
            self.expiry_heap.pop(&mut self.arena);
            self.release(id);
        }

        self.compact_if_stale();
        removed
    }

    // == Keys ==
    /// Returns the keys currently in the table, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.table.keys().cloned().collect();
        keys.sort();
        keys
    }

    // == Length ==
    /// Returns the current number of entries in the table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.table.len());
        stats
    }

    // == Evict Items ==
    /// Shrinks the table to `max_items`, expired entries first.
    ///
    /// Expiry is a hard floor: no live, unexpired entry is evicted while an
    /// expired one remains. The priority phase then removes lowest priority,
    /// least recently used entries.
    fn evict_items(&mut self) {
        if self.table.len() <= self.max_items {
            return;
        }

        let now = self.clock.now();
        let mut expired = 0;
        let mut evicted = 0;

        while self.table.len() > self.max_items {
            let Some(id) = self.expiry_heap.peek() else {
                break;
            };
            if self.is_live(id) {
                if !self.arena[id].is_expired(now) {
                    break;
                }
                self.table.remove(self.arena[id].key());
                self.stats.record_expiration();
                expired += 1;
            }
            self.expiry_heap.pop(&mut self.arena);
            self.release(id);
        }

        while self.table.len() > self.max_items {
            let Some(id) = self.priority_heap.pop(&mut self.arena) else {
                break;
            };
            if self.is_live(id) {
                self.table.remove(self.arena[id].key());
                self.stats.record_eviction();
                evicted += 1;
            }
            self.release(id);
        }

        debug!(
            expired,
            evicted,
            remaining = self.table.len(),
            max_items = self.max_items,
            "eviction pass complete"
        );

        self.compact_if_stale();
    }

    /// True if the table maps the item's key to this exact item.
    fn is_live(&self, id: ItemId) -> bool {
        self.table.get(self.arena[id].key()) == Some(&id)
    }

    /// Frees the arena slot once the item is out of the table and both heaps.
    fn release(&mut self, id: ItemId) {
        if !self.arena[id].is_indexed() && !self.is_live(id) {
            self.arena.remove(id);
        }
    }

    /// Sweeps stale entries out of a heap once it outgrows the table.
    fn compact_if_stale(&mut self) {
        let limit = self.table.len() * 2 + STALE_SLACK;
        let mut dropped = Vec::new();

        if self.priority_heap.len() > limit {
            let table = &self.table;
            dropped.extend(
                self.priority_heap
                    .retain(&mut self.arena, |id, item| table.get(item.key()) == Some(&id)),
            );
        }
        if self.expiry_heap.len() > limit {
            let table = &self.table;
            dropped.extend(
                self.expiry_heap
                    .retain(&mut self.arena, |id, item| table.get(item.key()) == Some(&id)),
            );
        }

        if !dropped.is_empty() {
            debug!(dropped = dropped.len(), "compacted stale heap entries");
        }
        for id in dropped {
            // Already freed if it was dropped from both heaps.
            if self.arena.get(id).is_some() {
                self.release(id);
            }
        }
    }
}

impl<V: Clone> PriorityCache<V> {
    // == Get ==
    /// Retrieves the value for `key`.
    ///
    /// Returns `None` if the key is absent or has expired; an expired entry is
    /// dropped from the table on the spot. A hit refreshes the entry's access
    /// time, moving it away from the front of the LRU order.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let Some(&id) = self.table.get(key) else {
            self.stats.record_miss();
            return None;
        };

        let now = self.clock.now();
        if self.arena[id].is_expired(now) {
            self.table.remove(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            self.compact_if_stale();
            return None;
        }

        self.arena[id].access = now;
        self.priority_heap.fix(&mut self.arena, id);
        self.stats.record_hit();
        Some(self.arena[id].value.clone())
    }
}

#[cfg(test)]
impl<V> PriorityCache<V> {
    /// Asserts table/heap parity, heap order and position bookkeeping.
    pub(crate) fn check_invariants(&self) {
        use std::collections::HashSet;

        for (key, &id) in &self.table {
            let item = &self.arena[id];
            assert_eq!(item.key(), key, "table key does not match item key");
            assert!(item.priority_index.is_some(), "{key} missing from priority heap");
            assert!(item.expiry_index.is_some(), "{key} missing from expiry heap");
        }

        let mut seen = HashSet::new();
        for (pos, id) in self.priority_heap.iter().enumerate() {
            assert_eq!(self.arena[id].priority_index, Some(pos));
            assert!(seen.insert(id), "duplicate priority heap entry");
        }
        let mut seen = HashSet::new();
        for (pos, id) in self.expiry_heap.iter().enumerate() {
            assert_eq!(self.arena[id].expiry_index, Some(pos));
            assert!(seen.insert(id), "duplicate expiry heap entry");
        }

        assert!(self.priority_heap.is_ordered(&self.arena), "priority heap out of order");
        assert!(self.expiry_heap.is_ordered(&self.arena), "expiry heap out of order");

        let live_in = |ids: Vec<ItemId>| ids.into_iter().filter(|&id| self.is_live(id)).count();
        assert_eq!(live_in(self.priority_heap.iter().collect()), self.table.len());
        assert_eq!(live_in(self.expiry_heap.iter().collect()), self.table.len());

        for (id, item) in self.arena.iter() {
            assert!(
                item.is_indexed() || self.is_live(id),
                "unreachable item {} was not released",
                item.key()
            );
        }
    }

    pub(crate) fn heap_lens(&self) -> (usize, usize) {
        (self.priority_heap.len(), self.expiry_heap.len())
    }
}
