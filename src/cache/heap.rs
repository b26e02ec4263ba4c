//! Indexed Heap Module
//!
//! Binary min-heap over [`ItemId`]s whose elements record their own position.
//!
//! Every swap writes the new position back into the moved items, so an item
//! whose ordering key changed can be restored in place with [`IndexedHeap::fix`]
//! in O(log n) without searching for it. Two orderings are used by the cache:
//! [`ExpiryOrder`] (soonest expiry first) and [`PriorityOrder`] (lowest
//! priority first, least recently accessed on ties).

use std::marker::PhantomData;

use crate::cache::{Item, ItemArena, ItemId};

// == Heap Order ==
/// Comparison rule and position field for one heap.
pub trait HeapOrder {
    /// Returns true if `a` must be popped before `b`.
    fn precedes<V>(a: &Item<V>, b: &Item<V>) -> bool;

    /// Position recorded on the item for this heap.
    fn position<V>(item: &Item<V>) -> Option<usize>;

    fn set_position<V>(item: &mut Item<V>, position: Option<usize>);
}

/// Orders items by expiry instant, soonest first.
#[derive(Debug, Clone, Copy)]
pub struct ExpiryOrder;

impl HeapOrder for ExpiryOrder {
    fn precedes<V>(a: &Item<V>, b: &Item<V>) -> bool {
        a.expire < b.expire
    }

    fn position<V>(item: &Item<V>) -> Option<usize> {
        item.expiry_index
    }

    fn set_position<V>(item: &mut Item<V>, position: Option<usize>) {
        item.expiry_index = position;
    }
}

/// Orders items by priority, then by access time (oldest first).
#[derive(Debug, Clone, Copy)]
pub struct PriorityOrder;

impl HeapOrder for PriorityOrder {
    fn precedes<V>(a: &Item<V>, b: &Item<V>) -> bool {
        (a.priority, a.access) < (b.priority, b.access)
    }

    fn position<V>(item: &Item<V>) -> Option<usize> {
        item.priority_index
    }

    fn set_position<V>(item: &mut Item<V>, position: Option<usize>) {
        item.priority_index = position;
    }
}

// == Indexed Heap ==
/// Min-heap of item handles ordered by `O`.
///
/// The heap does not own items; every operation takes the arena that does.
#[derive(Debug)]
pub struct IndexedHeap<O> {
    ids: Vec<ItemId>,
    order: PhantomData<O>,
}

impl<O: HeapOrder> IndexedHeap<O> {
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            order: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the handles in backing-array order.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.ids.iter().copied()
    }

    /// True if no entry precedes its parent.
    #[cfg(test)]
    pub fn is_ordered<V>(&self, arena: &ItemArena<V>) -> bool {
        (1..self.ids.len()).all(|i| !self.less(arena, i, (i - 1) / 2))
    }

    // == Peek ==
    /// Returns the minimum without removing it.
    pub fn peek(&self) -> Option<ItemId> {
        self.ids.first().copied()
    }

    // == Push ==
    /// Appends `id` and sifts it up to its place.
    pub fn push<V>(&mut self, arena: &mut ItemArena<V>, id: ItemId) {
        let pos = self.ids.len();
        O::set_position(&mut arena[id], Some(pos));
        self.ids.push(id);
        self.up(arena, pos);
    }

    // == Pop ==
    /// Removes and returns the minimum, clearing its recorded position.
    pub fn pop<V>(&mut self, arena: &mut ItemArena<V>) -> Option<ItemId> {
        let last = self.ids.len().checked_sub(1)?;
        self.swap(arena, 0, last);
        self.down(arena, 0, last);
        let id = self.ids.pop()?;
        O::set_position(&mut arena[id], None);
        Some(id)
    }

    // == Fix ==
    /// Restores heap order after the ordering key of `id` changed.
    ///
    /// Does nothing if the item is not in this heap.
    pub fn fix<V>(&mut self, arena: &mut ItemArena<V>, id: ItemId) {
        let Some(pos) = O::position(&arena[id]) else {
            return;
        };
        debug_assert_eq!(self.ids.get(pos), Some(&id), "recorded position is out of date");
        if !self.down(arena, pos, self.ids.len()) {
            self.up(arena, pos);
        }
    }

    // == Retain ==
    /// Drops every entry for which `keep` returns false and re-heapifies.
    ///
    /// Returns the dropped handles; their positions for this heap are cleared.
    pub fn retain<V, F>(&mut self, arena: &mut ItemArena<V>, mut keep: F) -> Vec<ItemId>
    where
        F: FnMut(ItemId, &Item<V>) -> bool,
    {
        let mut dropped = Vec::new();
        let ids = std::mem::take(&mut self.ids);
        for id in ids {
            if keep(id, &arena[id]) {
                self.ids.push(id);
            } else {
                O::set_position(&mut arena[id], None);
                dropped.push(id);
            }
        }

        for (pos, &id) in self.ids.iter().enumerate() {
            O::set_position(&mut arena[id], Some(pos));
        }
        let n = self.ids.len();
        for i in (0..n / 2).rev() {
            self.down(arena, i, n);
        }
        dropped
    }

    fn less<V>(&self, arena: &ItemArena<V>, i: usize, j: usize) -> bool {
        O::precedes(&arena[self.ids[i]], &arena[self.ids[j]])
    }

    fn swap<V>(&mut self, arena: &mut ItemArena<V>, i: usize, j: usize) {
        self.ids.swap(i, j);
        O::set_position(&mut arena[self.ids[i]], Some(i));
        O::set_position(&mut arena[self.ids[j]], Some(j));
    }

    fn up<V>(&mut self, arena: &mut ItemArena<V>, mut j: usize) {
        while j > 0 {
            let parent = (j - 1) / 2;
            if !self.less(arena, j, parent) {
                break;
            }
            self.swap(arena, parent, j);
            j = parent;
        }
    }

    /// Sifts the element at `start` down within the first `n` slots.
    /// Returns true if it moved.
    fn down<V>(&mut self, arena: &mut ItemArena<V>, start: usize, n: usize) -> bool {
        let mut i = start;
        loop {
            let left = 2 * i + 1;
            if left >= n {
                break;
            }
            let mut child = left;
            let right = left + 1;
            if right < n && self.less(arena, right, left) {
                child = right;
            }
            if !self.less(arena, child, i) {
                break;
            }
            self.swap(arena, i, child);
            i = child;
        }
        i > start
    }
}

impl<O: HeapOrder> Default for IndexedHeap<O> {
    fn default() -> Self {
        Self::new()
    }
}
