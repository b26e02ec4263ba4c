//! Item Arena Module
//!
//! Owns every [`Item`] and hands out stable [`ItemId`] handles. The key table
//! and both heaps refer to items only through these handles.

use std::ops::{Index, IndexMut};

use crate::cache::Item;

/// Stable handle to an item slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(usize);

// == Item Arena ==
/// Slot storage with a free list; freed slots are reused by later inserts.
#[derive(Debug)]
pub struct ItemArena<V> {
    slots: Vec<Option<Item<V>>>,
    free_list: Vec<usize>,
}

impl<V> ItemArena<V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    pub fn insert(&mut self, item: Item<V>) -> ItemId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.slots[idx] = Some(item);
            idx
        } else {
            self.slots.push(Some(item));
            self.slots.len() - 1
        };
        ItemId(idx)
    }

    pub fn remove(&mut self, id: ItemId) -> Option<Item<V>> {
        let item = self.slots.get_mut(id.0)?.take()?;
        self.free_list.push(id.0);
        Some(item)
    }

    pub fn get(&self, id: ItemId) -> Option<&Item<V>> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item<V>> {
        self.slots.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    /// Number of occupied slots, live and stale.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &Item<V>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|item| (ItemId(idx), item)))
    }
}

impl<V> Default for ItemArena<V> {
    fn default() -> Self {
        Self::new()
    }
}

// Heaps and the key table only hold ids of occupied slots, so indexing a freed
// slot is a broken invariant rather than a recoverable condition.
impl<V> Index<ItemId> for ItemArena<V> {
    type Output = Item<V>;

    fn index(&self, id: ItemId) -> &Item<V> {
        match self.get(id) {
            Some(item) => item,
            None => panic!("item slot {} is not occupied", id.0),
        }
    }
}

impl<V> IndexMut<ItemId> for ItemArena<V> {
    fn index_mut(&mut self, id: ItemId) -> &mut Item<V> {
        match self.get_mut(id) {
            Some(item) => item,
            None => panic!("item slot {} is not occupied", id.0),
        }
    }
}
