//! Configuration structures for the cache tiers.
//!
//! Configuration structs have all public fields for simple instantiation:
//! create the struct with every field set and hand it to the tier's
//! constructor. Capacity validation happens in the constructors, which
//! return an error before any state is built.
//!
//! # Examples
//!
//! ```
//! use flashtier::config::{DramCacheConfig, FifoCacheConfig, TieredCacheConfig};
//!
//! let config = TieredCacheConfig {
//!     dram: DramCacheConfig {
//!         capacity: 64 * 1024 * 1024, // 64 MiB
//!     },
//!     fifo: FifoCacheConfig {
//!         capacity: 2 * 1024 * 1024 * 1024, // 2 GiB
//!     },
//! };
//! assert!(config.fifo.capacity > config.dram.capacity);
//! ```

pub mod dram;
pub mod fifo;

pub use dram::DramCacheConfig;
pub use fifo::FifoCacheConfig;

/// Configuration for the two-tier cache coordinator.
#[derive(Debug, Clone, Copy)]
pub struct TieredCacheConfig {
    /// DRAM tier configuration.
    pub dram: DramCacheConfig,
    /// Flash FIFO tier configuration.
    pub fifo: FifoCacheConfig,
}
