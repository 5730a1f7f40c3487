//! Segmented flash FIFO tier.
//!
//! The tier models log-structured flash storage as a ring of fixed-size
//! segments, each a run of fixed-size pages:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                          FifoCache                                │
//! │                                                                   │
//! │   seg 0        seg 1        seg 2        seg 3                    │
//! │  ┌───────┐   ┌───────┐   ┌───────┐   ┌───────┐                    │
//! │  │p0..p63│   │p64..  │   │ ...   │   │ ...   │   ◀── ring         │
//! │  └───────┘   └───▲───┘   └───────┘   └───────┘                    │
//! │                  │ write pointer (wraps, bumping the              │
//! │                  │ rotation counter on every full lap)            │
//! │                                                                   │
//! │  key → global page id        overwritten side-table               │
//! │  (live entries only)         (entries lost to segment clears)     │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes always go to the current segment. When it cannot take the next
//! object the pointer advances, and the segment it lands on is cleared
//! wholesale; everything that was still resident there becomes a *victim*.
//! Victims move into the overwritten side-table so that later lookups of
//! those keys can be attributed to FIFO rotation rather than plain misses,
//! and each one is reported to the injected [`EvictionLog`].
//!
//! The tier also keeps two per-key histories feeding the analytics records:
//! the DRAM access count observed at every spill, and the global segment
//! pointer of every touch (spill or hit). Both histories are unbounded, as
//! in the system this simulates.
//!
//! Position in the log is described by the **global segment pointer**
//! `GSP(rotation, seg) = rotation * num_segments + seg`, which strictly
//! increases across inserts.

mod page;
mod segment;

use crate::config::FifoCacheConfig;
use crate::entry::{DramEntry, FifoEntry};
use crate::error::{Error, Result};
use crate::report::{EvictionLog, OverwrittenAccessRecord, OverwrittenRecord};
use segment::Segment;
use std::io;
use tracing::debug;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Ring of flash segments with a rotating write pointer.
pub struct FifoCache {
    num_segments: u32,
    segments: Vec<Segment>,
    cur_segment: u32,
    rotation_counter: u64,

    /// Global page id of every live key. The addressed page contains the key.
    key_to_page: HashMap<String, u32>,
    /// Entries lost to segment clears, kept for analytics. Disjoint from
    /// `key_to_page`.
    overwritten: HashMap<String, FifoEntry>,

    /// DRAM access counts observed each time a key was spilled.
    dram_access_history: HashMap<String, Vec<u32>>,
    /// Global segment pointers at which a key touched this tier.
    reuse_history: HashMap<String, Vec<u64>>,

    log: Box<dyn EvictionLog>,

    num_accesses: u64,
    num_hits: u64,
    num_overwritten_hits: u64,
}

impl FifoCache {
    /// Page capacity in bytes.
    pub const PAGE_SIZE: u32 = page::Page::SIZE;

    /// Segment capacity in bytes.
    pub const SEGMENT_SIZE: u32 = Segment::SIZE;

    /// Creates the segment ring for the configured capacity.
    ///
    /// Fails with [`Error::FifoCapacityTooSmall`] if the capacity cannot
    /// hold a single segment.
    pub fn new(config: FifoCacheConfig, log: Box<dyn EvictionLog>) -> Result<Self> {
        let num_segments = config.capacity / u64::from(Segment::SIZE);
        if num_segments == 0 {
            return Err(Error::FifoCapacityTooSmall {
                capacity: config.capacity,
                segment_size: u64::from(Segment::SIZE),
            });
        }
        let num_segments =
            u32::try_from(num_segments).expect("segment count fits in a page-id u32");

        Ok(Self {
            num_segments,
            segments: (0..num_segments).map(Segment::new).collect(),
            cur_segment: 0,
            rotation_counter: 0,
            key_to_page: HashMap::new(),
            overwritten: HashMap::new(),
            dram_access_history: HashMap::new(),
            reuse_history: HashMap::new(),
            log,
            num_accesses: 0,
            num_hits: 0,
            num_overwritten_hits: 0,
        })
    }

    /// Number of segments in the ring.
    #[inline]
    pub fn num_segments(&self) -> u32 {
        self.num_segments
    }

    /// Full wraps of the write pointer so far.
    #[inline]
    pub fn rotation_counter(&self) -> u64 {
        self.rotation_counter
    }

    /// Global segment pointer of the current write position.
    #[inline]
    pub fn global_write_ptr(&self) -> u64 {
        self.global_segment_ptr(self.rotation_counter, u64::from(self.cur_segment))
    }

    /// Number of live keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.key_to_page.len()
    }

    /// True iff the tier holds neither live keys nor overwritten records;
    /// a lookup could not possibly return anything.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.key_to_page.is_empty() && self.overwritten.is_empty()
    }

    /// True iff the key is live in some page.
    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.key_to_page.contains_key(key)
    }

    /// True iff the key sits in the overwritten side-table.
    #[inline]
    pub fn has_overwritten(&self, key: &str) -> bool {
        self.overwritten.contains_key(key)
    }

    /// Lookups served by this tier so far.
    #[inline]
    pub fn num_accesses(&self) -> u64 {
        self.num_accesses
    }

    /// Lookups resolved by a live entry.
    #[inline]
    pub fn num_hits(&self) -> u64 {
        self.num_hits
    }

    /// Lookups resolved by the overwritten side-table.
    #[inline]
    pub fn num_overwritten_hits(&self) -> u64 {
        self.num_overwritten_hits
    }

    fn global_segment_ptr(&self, rotation_counter: u64, segment: u64) -> u64 {
        rotation_counter * u64::from(self.num_segments) + segment
    }

    /// Appends a DRAM victim to the log, rotating the write pointer first if
    /// the current segment is full.
    ///
    /// A rotation clears the segment the pointer lands on; every entry that
    /// was still resident there is stamped with the rotation during which
    /// the segment was filled, reported to the overwritten stream, moved
    /// into the side-table, and returned to the caller.
    pub fn insert(&mut self, spilled: &DramEntry) -> Result<Vec<FifoEntry>> {
        let mut victims = Vec::new();

        if self.segments[self.cur_segment as usize].is_full(spilled.size) {
            self.cur_segment = (self.cur_segment + 1) % self.num_segments;
            if self.cur_segment == 0 {
                self.rotation_counter += 1;
                debug!(rotation = self.rotation_counter, "write pointer wrapped");
            }

            victims = self.segments[self.cur_segment as usize].clear();
            for victim in &mut victims {
                // The cleared segment was written exactly one lap ago. A
                // non-empty segment implies a previous lap, so the counter
                // is at least 1 here.
                debug_assert!(self.rotation_counter > 0);
                victim.rotation_counter = self.rotation_counter - 1;

                assert_eq!(
                    victim.seg_id, self.cur_segment,
                    "victim `{}` cleared out of segment {}",
                    victim.key, victim.seg_id
                );
                self.key_to_page.remove(&victim.key);

                let reuse = self
                    .reuse_history
                    .get(&victim.key)
                    .expect("overwritten key has a reuse history");
                let reuse_distance = match reuse.len() {
                    1 => 0,
                    n => reuse[n - 1] - reuse[n - 2],
                };
                let first_dram_access_count = self
                    .dram_access_history
                    .get(&victim.key)
                    .expect("overwritten key has a dram access history")[0];

                let record = OverwrittenRecord {
                    global_segment_ptr: self
                        .global_segment_ptr(victim.rotation_counter, u64::from(self.cur_segment)),
                    num_accesses: victim.num_accesses,
                    first_dram_access_count,
                    reuse_distance,
                };
                self.log.overwritten(&record)?;

                // A later eviction of the same key replaces the record.
                self.overwritten.insert(victim.key.clone(), victim.clone());
            }
        }

        self.dram_access_history
            .entry(spilled.key.clone())
            .or_default()
            .push(spilled.num_accesses);
        let write_ptr = self.global_write_ptr();
        self.reuse_history
            .entry(spilled.key.clone())
            .or_default()
            .push(write_ptr);

        assert!(
            self.cur_segment < self.num_segments,
            "write pointer {} ran past {} segments",
            self.cur_segment,
            self.num_segments
        );

        // Soft-delete any stale live copy before the key is re-indexed.
        self.remove(&spilled.key);
        let page_id = self.segments[self.cur_segment as usize].insert(&spilled.key, spilled.size);
        self.key_to_page.insert(spilled.key.clone(), page_id);

        Ok(victims)
    }

    /// Looks up a key, counting the access either way.
    ///
    /// A live key is served from its page, bumps the entry's access counter
    /// and extends the key's reuse history. A key found in the overwritten
    /// side-table is *not* a hit: it emits an overwritten-accessed record,
    /// consumes the side-table entry and reports a miss.
    pub fn lookup(&mut self, key: &str) -> Result<Option<FifoEntry>> {
        self.num_accesses += 1;

        if let Some(&page_id) = self.key_to_page.get(key) {
            self.num_hits += 1;

            let seg_id = page_id / Segment::PAGES_PER_SEGMENT;
            let entry = self.segments[seg_id as usize].lookup(key, page_id);
            let Some(entry) = entry else {
                unreachable!("key `{key}` indexed to page {page_id} but not resident there");
            };

            let write_ptr = self.global_write_ptr();
            self.reuse_history
                .get_mut(key)
                .expect("live key has a reuse history")
                .push(write_ptr);

            return Ok(Some(entry));
        }

        if let Some(victim) = self.overwritten.remove(key) {
            self.num_overwritten_hits += 1;

            let segment_distance = self.global_write_ptr()
                - self.global_segment_ptr(victim.rotation_counter, u64::from(victim.seg_id));
            self.log.overwritten_accessed(&OverwrittenAccessRecord {
                segment_distance,
                num_accesses_before: victim.num_accesses,
            })?;
        }

        Ok(None)
    }

    /// Soft-deletes a live key and drops it from the index. Overwritten
    /// records and per-key histories are untouched.
    pub fn remove(&mut self, key: &str) {
        if let Some(page_id) = self.key_to_page.remove(key) {
            let seg_id = page_id / Segment::PAGES_PER_SEGMENT;
            self.segments[seg_id as usize].remove(key, page_id);
        }
    }

    /// Flushes the analytics streams.
    pub fn flush_log(&mut self) -> io::Result<()> {
        self.log.flush()
    }
}

impl core::fmt::Debug for FifoCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FifoCache")
            .field("num_segments", &self.num_segments)
            .field("cur_segment", &self.cur_segment)
            .field("rotation_counter", &self.rotation_counter)
            .field("live_keys", &self.key_to_page.len())
            .field("overwritten_keys", &self.overwritten.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemoryEvictionLog;

    /// Object size whose footprint is exactly a quarter page, so a segment
    /// holds exactly 4 * 64 = 256 of them.
    const OBJ: u32 = page::Page::SIZE / 4 - FifoEntry::METADATA_SIZE;
    const PER_SEGMENT: usize = 256;

    fn tier(segments: u64) -> (FifoCache, MemoryEvictionLog) {
        let log = MemoryEvictionLog::new();
        let fifo = FifoCache::new(
            FifoCacheConfig {
                capacity: segments * u64::from(Segment::SIZE),
            },
            Box::new(log.clone()),
        )
        .unwrap();
        (fifo, log)
    }

    fn spill(fifo: &mut FifoCache, key: &str, dram_accesses: u32) -> Vec<FifoEntry> {
        let mut entry = DramEntry::new(key, OBJ, false);
        entry.num_accesses = dram_accesses;
        fifo.insert(&entry).unwrap()
    }

    #[test]
    fn test_capacity_below_one_segment_is_rejected() {
        let err = FifoCache::new(
            FifoCacheConfig {
                capacity: u64::from(Segment::SIZE) - 1,
            },
            Box::new(MemoryEvictionLog::new()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::FifoCapacityTooSmall { .. }));
    }

    #[test]
    fn test_insert_then_lookup_hits() {
        let (mut fifo, _log) = tier(2);
        spill(&mut fifo, "a", 3);

        assert!(fifo.contains("a"));
        let entry = fifo.lookup("a").unwrap().unwrap();
        assert_eq!(entry.key, "a");
        assert_eq!(entry.num_accesses, 1);
        assert_eq!(fifo.num_accesses(), 1);
        assert_eq!(fifo.num_hits(), 1);

        // The counter sticks across lookups.
        assert_eq!(fifo.lookup("a").unwrap().unwrap().num_accesses, 2);
    }

    #[test]
    fn test_lookup_miss_counts_access() {
        let (mut fifo, _log) = tier(1);
        assert!(fifo.lookup("nope").unwrap().is_none());
        assert_eq!(fifo.num_accesses(), 1);
        assert_eq!(fifo.num_hits(), 0);
        assert_eq!(fifo.num_overwritten_hits(), 0);
    }

    #[test]
    fn test_remove_hides_key_without_touching_histories() {
        let (mut fifo, _log) = tier(1);
        spill(&mut fifo, "a", 0);
        fifo.remove("a");

        assert!(!fifo.contains("a"));
        assert!(fifo.lookup("a").unwrap().is_none());
        // Re-spilling works because the histories are still there.
        spill(&mut fifo, "a", 0);
        assert!(fifo.contains("a"));
    }

    #[test]
    fn test_single_segment_rotation_overwrites_everything() {
        let (mut fifo, log) = tier(1);

        for i in 0..PER_SEGMENT {
            let victims = spill(&mut fifo, &format!("k{i}"), 0);
            assert!(victims.is_empty());
        }
        assert_eq!(fifo.rotation_counter(), 0);

        // The next spill wraps the pointer back onto the only segment.
        let victims = spill(&mut fifo, "fresh", 0);
        assert_eq!(victims.len(), PER_SEGMENT);
        assert_eq!(fifo.rotation_counter(), 1);

        // Victims are stamped with the rotation the segment was filled in.
        for victim in &victims {
            assert_eq!(victim.rotation_counter, 0);
            assert!(fifo.has_overwritten(&victim.key));
            assert!(!fifo.contains(&victim.key));
        }
        assert!(fifo.contains("fresh"));

        let records = log.overwritten();
        assert_eq!(records.len(), PER_SEGMENT);
        for record in &records {
            assert_eq!(record.global_segment_ptr, 0);
            assert_eq!(record.num_accesses, 0);
            assert_eq!(record.reuse_distance, 0);
        }
    }

    #[test]
    fn test_overwritten_access_is_a_miss_with_a_record() {
        let (mut fifo, log) = tier(1);
        for i in 0..=PER_SEGMENT {
            spill(&mut fifo, &format!("k{i}"), 0);
        }
        assert!(fifo.has_overwritten("k0"));

        let accesses_before = fifo.num_accesses();
        assert!(fifo.lookup("k0").unwrap().is_none());
        assert_eq!(fifo.num_accesses(), accesses_before + 1);
        assert_eq!(fifo.num_overwritten_hits(), 1);
        assert!(!fifo.has_overwritten("k0"));

        let records = log.accessed();
        assert_eq!(records.len(), 1);
        // Write pointer at GSP 1, eviction position at GSP 0.
        assert_eq!(records[0].segment_distance, 1);
        assert_eq!(records[0].num_accesses_before, 0);

        // The record is consumed: a second lookup is a plain miss.
        assert!(fifo.lookup("k0").unwrap().is_none());
        assert_eq!(log.accessed().len(), 1);
        assert_eq!(fifo.num_overwritten_hits(), 1);
    }

    #[test]
    fn test_multi_segment_ring_rotates_without_wrap_first() {
        let (mut fifo, log) = tier(2);

        // Fill segment 0; the next spill advances onto the empty segment 1
        // and clears it with no victims.
        for i in 0..PER_SEGMENT {
            spill(&mut fifo, &format!("a{i}"), 0);
        }
        let victims = spill(&mut fifo, "b0", 0);
        assert!(victims.is_empty());
        assert_eq!(fifo.rotation_counter(), 0);
        assert_eq!(fifo.global_write_ptr(), 1);

        // Fill the rest of segment 1; the wrap clears segment 0.
        for i in 1..PER_SEGMENT {
            spill(&mut fifo, &format!("b{i}"), 0);
        }
        let victims = spill(&mut fifo, "c0", 0);
        assert_eq!(victims.len(), PER_SEGMENT);
        assert_eq!(fifo.rotation_counter(), 1);
        assert_eq!(fifo.global_write_ptr(), 2);
        assert!(victims.iter().all(|v| v.key.starts_with('a')));
        assert!(victims.iter().all(|v| v.rotation_counter == 0));
        assert!(log.overwritten().iter().all(|r| r.global_segment_ptr == 0));
    }

    #[test]
    fn test_global_write_ptr_is_monotonic() {
        let (mut fifo, _log) = tier(2);
        let mut prev = fifo.global_write_ptr();
        for i in 0..3 * PER_SEGMENT {
            spill(&mut fifo, &format!("k{i}"), 0);
            let cur = fifo.global_write_ptr();
            assert!(cur >= prev, "write pointer moved backwards at {i}");
            prev = cur;
        }
        assert!(prev >= 2);
    }

    #[test]
    fn test_respill_records_reuse_distance_and_first_dram_count() {
        let (mut fifo, log) = tier(1);

        // "a" is spilled during rotation 0 with 5 dram hits...
        spill(&mut fifo, "a", 5);
        for i in 1..=PER_SEGMENT {
            spill(&mut fifo, &format!("k{i}"), 0);
        }
        // ...and again during rotation 1 (GSP 1) with 2 dram hits.
        assert!(fifo.has_overwritten("a"));
        spill(&mut fifo, "a", 2);
        assert!(fifo.contains("a"));

        // Drive a second full rotation so "a" is overwritten again.
        for i in 1..=PER_SEGMENT {
            spill(&mut fifo, &format!("m{i}"), 0);
        }
        assert!(fifo.has_overwritten("a"));

        let record = log
            .overwritten()
            .into_iter()
            .filter(|r| r.global_segment_ptr == 1)
            .find(|r| r.first_dram_access_count == 5)
            .expect("second eviction of `a` was logged");
        // Touched at GSP 0 and GSP 1: reuse distance 1. The first spill's
        // dram count stays the first history element.
        assert_eq!(record.reuse_distance, 1);
    }

    #[test]
    fn test_reeviction_replaces_overwritten_record() {
        let (mut fifo, _log) = tier(1);
        spill(&mut fifo, "a", 0);
        for i in 1..=PER_SEGMENT {
            spill(&mut fifo, &format!("k{i}"), 0);
        }
        assert!(fifo.has_overwritten("a"));

        // Re-spill and overwrite again; the side-table holds the new copy.
        spill(&mut fifo, "a", 0);
        for i in 1..=PER_SEGMENT {
            spill(&mut fifo, &format!("m{i}"), 0);
        }
        assert!(fifo.has_overwritten("a"));
        assert!(!fifo.contains("a"));

        // The replacement carries the later rotation stamp.
        assert!(fifo.lookup("a").unwrap().is_none());
        assert_eq!(fifo.num_overwritten_hits(), 1);
    }
}
