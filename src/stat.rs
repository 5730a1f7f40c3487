//! Cumulative simulation counters.
//!
//! `Stat` is a plain value type. The driver samples it once per request and
//! subtracts consecutive samples to obtain windowed metrics, so the type
//! supports field-wise subtraction via the `-` operator.

use core::ops::Sub;

/// Cumulative counters for a simulation run.
///
/// Counter relationships that hold after every operation:
/// `num_hits <= num_accesses`,
/// `num_dram_hits <= num_dram_accesses <= num_accesses` and
/// `num_fifo_hits <= num_fifo_accesses <= num_accesses - num_dram_hits`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// Lookups that reached the flash FIFO tier.
    pub num_fifo_accesses: u64,
    /// Lookups resolved by a live flash entry.
    pub num_fifo_hits: u64,
    /// Lookups resolved by the overwritten side-table (analytics only;
    /// these do not count as cache hits).
    pub num_fifo_overwritten_hits: u64,
    /// Lookups that reached the DRAM tier.
    pub num_dram_accesses: u64,
    /// Lookups resolved by a DRAM-resident entry.
    pub num_dram_hits: u64,
    /// Top-level lookups.
    pub num_accesses: u64,
    /// Top-level lookups resolved by either tier.
    pub num_hits: u64,
    /// Top-level removals.
    pub num_removed: u64,
}

impl Stat {
    /// Overall miss ratio in percent, or 0 before the first access.
    pub fn miss_ratio(&self) -> f64 {
        if self.num_accesses == 0 {
            return 0.0;
        }
        let num_misses = self.num_accesses - self.num_hits;
        num_misses as f64 / self.num_accesses as f64 * 100.0
    }

    /// Share of flash misses that landed in the overwritten side-table,
    /// in percent, or 0 when there were no flash misses.
    pub fn overwritten_hit_ratio(&self) -> f64 {
        let num_fifo_misses = self.num_fifo_accesses - self.num_fifo_hits;
        if num_fifo_misses == 0 {
            return 0.0;
        }
        self.num_fifo_overwritten_hits as f64 / num_fifo_misses as f64 * 100.0
    }
}

impl Sub for Stat {
    type Output = Stat;

    fn sub(self, rhs: Stat) -> Stat {
        Stat {
            num_fifo_accesses: self.num_fifo_accesses - rhs.num_fifo_accesses,
            num_fifo_hits: self.num_fifo_hits - rhs.num_fifo_hits,
            num_fifo_overwritten_hits: self.num_fifo_overwritten_hits
                - rhs.num_fifo_overwritten_hits,
            num_dram_accesses: self.num_dram_accesses - rhs.num_dram_accesses,
            num_dram_hits: self.num_dram_hits - rhs.num_dram_hits,
            num_accesses: self.num_accesses - rhs.num_accesses,
            num_hits: self.num_hits - rhs.num_hits,
            num_removed: self.num_removed - rhs.num_removed,
        }
    }
}
