//! Two-tier cache coordinator.
//!
//! `TieredCache` owns the DRAM tier and the flash FIFO tier and routes a
//! per-key workload across them:
//!
//! - lookups try DRAM first, then flash; a flash hit **promotes** the key
//!   back into DRAM;
//! - fresh inserts go to DRAM only; objects reach flash exclusively by
//!   **spilling** out of DRAM;
//! - spilling filters on the origin flag: a victim that entered DRAM via a
//!   flash hit is not re-inserted, because its flash copy is either still
//!   live or already overwritten.
//!
//! The intended driver pattern per trace record: on DELETE call
//! [`TieredCache::remove`]; on GET call [`TieredCache::lookup`] and, on a
//! miss, [`TieredCache::insert`].

use crate::config::TieredCacheConfig;
use crate::dram::DramCache;
use crate::entry::DramEntry;
use crate::error::Result;
use crate::fifo::FifoCache;
use crate::report::EvictionLog;
use crate::stat::Stat;
use std::io;

/// Coordinator owning both cache tiers.
pub struct TieredCache {
    dram: DramCache,
    fifo: FifoCache,
    num_accesses: u64,
    num_hits: u64,
    num_removed: u64,
}

impl TieredCache {
    /// Builds both tiers, handing the analytics sink to the flash tier.
    pub fn new(config: TieredCacheConfig, log: Box<dyn EvictionLog>) -> Result<Self> {
        Ok(Self {
            dram: DramCache::new(config.dram),
            fifo: FifoCache::new(config.fifo, log)?,
            num_accesses: 0,
            num_hits: 0,
            num_removed: 0,
        })
    }

    /// The DRAM tier.
    #[inline]
    pub fn dram(&self) -> &DramCache {
        &self.dram
    }

    /// The flash FIFO tier.
    #[inline]
    pub fn fifo(&self) -> &FifoCache {
        &self.fifo
    }

    /// Looks up a key in both tiers, promoting on a flash hit.
    ///
    /// Returns `true` iff either tier held the key. The flash tier is only
    /// consulted while it holds anything at all, so a DRAM-only workload
    /// never counts flash accesses.
    pub fn lookup(&mut self, key: &str) -> Result<bool> {
        self.num_accesses += 1;

        if self.dram.lookup(key).is_some() {
            self.num_hits += 1;
            return Ok(true);
        }

        if self.fifo.is_empty() {
            return Ok(false);
        }
        if let Some(item) = self.fifo.lookup(key)? {
            self.num_hits += 1;
            let victims = self.dram.insert(key, item.size, true)?;
            self.spill(victims)?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Inserts a fresh object into DRAM, spilling whatever falls out.
    ///
    /// The object itself is not written to flash; it only gets there if it
    /// later falls out of DRAM unpromoted.
    pub fn insert(&mut self, key: &str, size: u32) -> Result<()> {
        let victims = self.dram.insert(key, size, false)?;
        self.spill(victims)
    }

    /// Removes a key from both tiers unconditionally.
    pub fn remove(&mut self, key: &str) {
        self.num_removed += 1;
        self.dram.remove(key);
        self.fifo.remove(key);
    }

    /// Snapshot of all counters.
    pub fn stat(&self) -> Stat {
        Stat {
            num_fifo_accesses: self.fifo.num_accesses(),
            num_fifo_hits: self.fifo.num_hits(),
            num_fifo_overwritten_hits: self.fifo.num_overwritten_hits(),
            num_dram_accesses: self.dram.num_accesses(),
            num_dram_hits: self.dram.num_hits(),
            num_accesses: self.num_accesses,
            num_hits: self.num_hits,
            num_removed: self.num_removed,
        }
    }

    /// Flushes the analytics streams.
    pub fn flush(&mut self) -> io::Result<()> {
        self.fifo.flush_log()
    }

    fn spill(&mut self, victims: Vec<DramEntry>) -> Result<()> {
        for victim in victims {
            if !victim.from_fifo {
                self.fifo.insert(&victim)?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for TieredCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TieredCache")
            .field("dram", &self.dram)
            .field("fifo", &self.fifo)
            .field("num_accesses", &self.num_accesses)
            .field("num_hits", &self.num_hits)
            .finish()
    }
}
