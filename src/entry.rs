//! Entry types for the two cache tiers.
//!
//! Both tiers index objects by an opaque string key and track the declared
//! object size in bytes. The tiers attach different bookkeeping to an entry:
//!
//! - [`DramEntry`] lives in the recency list of the DRAM tier. Its access
//!   counter accumulates DRAM hits while the entry is resident and is carried
//!   into the flash tier's per-key history when the entry is spilled.
//! - [`FifoEntry`] lives in a flash page. Its access counter starts fresh on
//!   every page insertion and counts flash hits only; the segment id and
//!   rotation counter pin down *where* in the rotating log the entry was
//!   written, which is what the overwritten analytics are computed from.

use core::fmt;

/// An object resident in the DRAM tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DramEntry {
    /// The cached key. Unique within the DRAM tier.
    pub key: String,
    /// Declared object size in bytes. Excludes any metadata overhead.
    pub size: u32,
    /// DRAM hits accumulated while resident. Resets on re-insertion.
    pub num_accesses: u32,
    /// True iff the entry entered DRAM through a flash hit rather than a
    /// fresh trace insert. A victim with this flag set is never re-spilled:
    /// its flash copy is either still live or already overwritten.
    pub from_fifo: bool,
}

impl DramEntry {
    /// Creates a fresh entry with a zeroed access counter.
    pub fn new(key: impl Into<String>, size: u32, from_fifo: bool) -> Self {
        Self {
            key: key.into(),
            size,
            num_accesses: 0,
            from_fifo,
        }
    }
}

/// An object resident in (or evicted from) the flash FIFO tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FifoEntry {
    /// The cached key. Unique within a page.
    pub key: String,
    /// Declared object size in bytes. Excludes [`FifoEntry::METADATA_SIZE`].
    pub size: u32,
    /// Flash hits accrued while page-resident. Starts at zero on insertion.
    pub num_accesses: u32,
    /// Segment the entry was written into.
    pub seg_id: u32,
    /// Full wraps of the write pointer at the time the entry's segment was
    /// filled. Zero while live; stamped when the segment is cleared.
    pub rotation_counter: u64,
    /// Soft-delete marker. Erased entries keep their page bytes until the
    /// enclosing segment is cleared.
    pub is_erased: bool,
}

impl FifoEntry {
    /// Fixed per-entry metadata overhead charged against page capacity.
    pub const METADATA_SIZE: u32 = 20;

    /// Creates a fresh entry for a page insertion.
    pub fn new(key: impl Into<String>, size: u32, seg_id: u32) -> Self {
        Self {
            key: key.into(),
            size,
            num_accesses: 0,
            seg_id,
            rotation_counter: 0,
            is_erased: false,
        }
    }

    /// Bytes this entry occupies in its page, metadata included.
    #[inline]
    pub fn footprint(&self) -> u32 {
        self.size + Self::METADATA_SIZE
    }
}

impl fmt::Display for FifoEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} B, seg {}, rot {})",
            self.key, self.size, self.seg_id, self.rotation_counter
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dram_entry_starts_unaccessed() {
        let entry = DramEntry::new("a", 128, false);
        assert_eq!(entry.num_accesses, 0);
        assert!(!entry.from_fifo);
    }

    #[test]
    fn test_fifo_entry_footprint_includes_metadata() {
        let entry = FifoEntry::new("a", 1000, 3);
        assert_eq!(entry.footprint(), 1000 + FifoEntry::METADATA_SIZE);
        assert_eq!(entry.seg_id, 3);
        assert!(!entry.is_erased);
        assert_eq!(entry.rotation_counter, 0);
    }
}
