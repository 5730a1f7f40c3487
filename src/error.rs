//! Error types for the cache engine.
//!
//! Configuration and capacity violations are reported through [`Error`];
//! internal invariant violations abort via assertions instead, since they
//! indicate bugs rather than recoverable conditions.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors surfaced by the cache engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The flash tier needs room for at least one full segment.
    #[error("fifo capacity {capacity} B is smaller than one segment ({segment_size} B)")]
    FifoCapacityTooSmall {
        /// Configured flash capacity in bytes.
        capacity: u64,
        /// Fixed segment size in bytes.
        segment_size: u64,
    },

    /// An object larger than the whole DRAM tier can never become resident.
    /// Callers are expected to filter such objects out of the workload.
    #[error("object `{key}` ({size} B) does not fit in dram capacity {capacity} B")]
    ObjectTooLarge {
        /// Key of the rejected object.
        key: String,
        /// Declared object size in bytes.
        size: u32,
        /// Configured DRAM capacity in bytes.
        capacity: u64,
    },

    /// Writing to one of the eviction log sinks failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
