//! Fixed-size flash page.
//!
//! A page is a 4 KiB bucket holding multiple keyed entries. Each resident
//! entry is charged its size plus a fixed metadata overhead, so the
//! capacity arithmetic is
//!
//! `free_capacity + Σ entry.footprint() = PAGE_SIZE`
//!
//! counting soft-deleted entries until the enclosing segment is cleared.
//! Removal never reclaims page bytes: the write pointer of the tier only
//! moves forward, which is the essence of log-structured allocation, so
//! pages accumulate dead bytes until their segment rotates.

use crate::entry::FifoEntry;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

pub(crate) struct Page {
    seg_id: u32,
    page_id: u32,
    free_capacity: u32,
    entries: HashMap<String, FifoEntry>,
}

impl Page {
    /// Page capacity in bytes.
    pub(crate) const SIZE: u32 = 4096;

    pub(crate) fn new(seg_id: u32, page_id: u32) -> Self {
        Self {
            seg_id,
            page_id,
            free_capacity: Self::SIZE,
            entries: HashMap::new(),
        }
    }

    /// True iff an object of `size` bytes (plus metadata) does not fit.
    pub(crate) fn is_full(&self, size: u32) -> bool {
        self.free_capacity < size + FifoEntry::METADATA_SIZE
    }

    /// Stores a fresh entry and returns the page's global id.
    ///
    /// The caller must have checked `is_full` first. Re-inserting a key that
    /// is already resident charges the page again; the stale bytes stay dead
    /// until the segment clears.
    pub(crate) fn insert(&mut self, key: &str, size: u32) -> u32 {
        assert!(
            self.free_capacity >= size + FifoEntry::METADATA_SIZE,
            "page {} cannot hold {} B ({} B free)",
            self.page_id,
            size,
            self.free_capacity
        );
        self.free_capacity -= size + FifoEntry::METADATA_SIZE;
        self.entries
            .insert(key.to_owned(), FifoEntry::new(key, size, self.seg_id));
        self.page_id
    }

    /// Looks up a key, bumping its access counter and returning a snapshot.
    pub(crate) fn lookup(&mut self, key: &str) -> Option<FifoEntry> {
        let entry = self.entries.get_mut(key)?;
        entry.num_accesses += 1;
        Some(entry.clone())
    }

    /// Soft-deletes a key. Space is not reclaimed until the segment clears.
    pub(crate) fn remove(&mut self, key: &str) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.is_erased = true;
        }
    }

    /// Drains every entry (erased ones included) into `victims` and resets
    /// the page to empty.
    pub(crate) fn clear(&mut self, victims: &mut Vec<FifoEntry>) {
        self.free_capacity = Self::SIZE;
        victims.extend(self.entries.drain().map(|(_, entry)| entry));
    }

    /// Number of entries in the page map, erased ones included.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn free_capacity(&self) -> u32 {
        self.free_capacity
    }
}
