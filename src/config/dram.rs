//! Configuration for the DRAM tier.

use core::fmt;

/// Configuration for the size-aware DRAM LRU tier.
///
/// The tier is bounded purely by bytes; there is no entry-count limit.
/// Objects larger than `capacity` are rejected at insertion time, so the
/// capacity must be at least as large as the biggest object the workload
/// can present.
#[derive(Clone, Copy)]
pub struct DramCacheConfig {
    /// Total DRAM capacity in bytes.
    pub capacity: u64,
}

impl fmt::Debug for DramCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DramCacheConfig")
            .field("capacity", &self.capacity)
            .finish()
    }
}
