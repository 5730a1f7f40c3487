//! Configuration for the flash FIFO tier.

use core::fmt;

/// Configuration for the segmented flash FIFO tier.
///
/// The capacity is carved into fixed 256 KiB segments; any remainder that
/// does not fill a whole segment is unused. A capacity smaller than one
/// segment is a configuration error reported by the tier constructor.
#[derive(Clone, Copy)]
pub struct FifoCacheConfig {
    /// Total flash capacity in bytes.
    pub capacity: u64,
}

impl fmt::Debug for FifoCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FifoCacheConfig")
            .field("capacity", &self.capacity)
            .finish()
    }
}
