//! Size-aware LRU DRAM tier.
//!
//! The tier keeps entries in a recency list combined with a key index for
//! O(1) lookup and reposition, the classic LRU layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DramCache                             │
//! │                                                              │
//! │  HashMap<key, *Node>        Doubly-Linked List               │
//! │  ┌──────────────┐          ┌───────────────────────────┐    │
//! │  │ "apple"  ─────────────▶ │ MRU ◀──▶ ... ◀──▶ LRU    │    │
//! │  │ "banana" ─────────────▶ │                           │    │
//! │  └──────────────┘          └───────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unlike a count-bounded LRU, residency here is bounded purely by bytes:
//! an insertion evicts from the LRU tail until the incoming object fits,
//! and the evicted entries are reported back to the caller so they can be
//! spilled into the flash tier. Accounting invariant, preserved by every
//! operation:
//!
//! `free_capacity + Σ resident.size = capacity`

use crate::config::DramCacheConfig;
use crate::entry::DramEntry;
use crate::error::{Error, Result};
use crate::list::{List, Node};
use tracing::info;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Size-aware LRU cache fronting the flash tier.
pub struct DramCache {
    capacity: u64,
    free_capacity: u64,
    list: List<DramEntry>,
    map: HashMap<String, *mut Node<DramEntry>>,
    num_accesses: u64,
    num_hits: u64,
}

impl DramCache {
    /// Creates an empty tier with the configured byte capacity.
    pub fn new(config: DramCacheConfig) -> Self {
        info!(
            "DRAM size: {:.2} MB",
            config.capacity as f64 / (1024.0 * 1024.0)
        );
        Self {
            capacity: config.capacity,
            free_capacity: config.capacity,
            list: List::new(),
            map: HashMap::new(),
            num_accesses: 0,
            num_hits: 0,
        }
    }

    /// Configured capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Bytes not currently occupied by resident entries.
    #[inline]
    pub fn free_capacity(&self) -> u64 {
        self.free_capacity
    }

    /// Number of resident entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if no entries are resident.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Lookups served by this tier so far.
    #[inline]
    pub fn num_accesses(&self) -> u64 {
        self.num_accesses
    }

    /// Lookups that found a resident entry.
    #[inline]
    pub fn num_hits(&self) -> u64 {
        self.num_hits
    }

    /// Looks up a key, counting the access either way.
    ///
    /// On a hit the entry moves to the MRU position, its access counter is
    /// incremented, and a copy reflecting the new count is returned.
    pub fn lookup(&mut self, key: &str) -> Option<DramEntry> {
        self.num_accesses += 1;

        let node = self.map.get(key).copied()?;
        self.num_hits += 1;
        unsafe {
            // SAFETY: node comes from our map, so it is linked into our list.
            self.list.move_to_front(node);
            let entry = (*node).value_mut();
            debug_assert_eq!(entry.key, key);
            entry.num_accesses += 1;
            Some(entry.clone())
        }
    }

    /// Returns a copy of a resident entry without touching recency order or
    /// any counter.
    pub fn peek(&self, key: &str) -> Option<DramEntry> {
        let node = self.map.get(key).copied()?;
        // SAFETY: node comes from our map, so it is linked into our list.
        unsafe { Some((*node).value().clone()) }
    }

    /// Inserts a key at the MRU position, evicting from the LRU tail until
    /// the object fits.
    ///
    /// Returns the evicted entries in eviction order (least recently used
    /// first) so the caller can spill them. An object larger than the whole
    /// tier is rejected with [`Error::ObjectTooLarge`]; the workload filter
    /// is expected to keep such objects out.
    pub fn insert(&mut self, key: &str, size: u32, from_fifo: bool) -> Result<Vec<DramEntry>> {
        if u64::from(size) > self.capacity {
            return Err(Error::ObjectTooLarge {
                key: key.to_owned(),
                size,
                capacity: self.capacity,
            });
        }
        debug_assert!(
            !self.map.contains_key(key),
            "insert of live dram key `{key}`"
        );

        let mut victims = Vec::new();
        while self.free_capacity < u64::from(size) {
            let Some(node) = self.list.pop_back() else {
                unreachable!(
                    "dram accounting out of sync: free {} of {} with empty list",
                    self.free_capacity, self.capacity
                );
            };
            let victim = node.into_value();
            self.map.remove(&victim.key);
            self.free_capacity += u64::from(victim.size);
            victims.push(victim);
        }

        let node = self.list.push_front(DramEntry::new(key, size, from_fifo));
        self.map.insert(key.to_owned(), node);
        self.free_capacity -= u64::from(size);
        debug_assert_eq!(self.map.len(), self.list.len());

        Ok(victims)
    }

    /// Drops an entry if present, freeing its bytes. Does not emit a victim.
    pub fn remove(&mut self, key: &str) {
        if let Some(node) = self.map.remove(key) {
            // SAFETY: node comes from our map, so it is linked into our list.
            if let Some(node) = unsafe { self.list.remove(node) } {
                let entry = node.into_value();
                debug_assert_eq!(entry.key, key);
                self.free_capacity += u64::from(entry.size);
            }
        }
    }
}

impl core::fmt::Debug for DramCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DramCache")
            .field("capacity", &self.capacity)
            .field("free_capacity", &self.free_capacity)
            .field("len", &self.map.len())
            .finish()
    }
}
