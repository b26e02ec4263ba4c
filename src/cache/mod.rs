//! Cache Module
//!
//! Provides an in-memory cache with TTL expiration, priority eviction and LRU
//! tie-breaking.

mod arena;
mod clock;
mod heap;
mod item;
mod stats;
mod store;


use std::time::Duration;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use stats::CacheStats;
pub use store::PriorityCache;

// Engine internals
pub(crate) use arena::{ItemArena, ItemId};
pub(crate) use heap::{ExpiryOrder, HeapOrder, IndexedHeap, PriorityOrder};
pub(crate) use item::Item;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Longest accepted time-to-live; larger values are clamped
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Stale heap entries tolerated beyond twice the live count before compaction
pub const STALE_SLACK: usize = 64;
