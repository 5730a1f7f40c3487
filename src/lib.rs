#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Components
//!
//! | Type | Role |
//! |------|------|
//! | [`TieredCache`] | Coordinator routing lookups, inserts and removals across both tiers |
//! | [`DramCache`] | Size-aware LRU fronting the flash tier, reports eviction victims |
//! | [`FifoCache`] | Ring of 256 KiB segments with a rotating write pointer and overwritten-entry analytics |
//! | [`Stat`] | Cumulative counters with field-wise subtraction for windowed metrics |
//! | [`report::EvictionLog`] | Pluggable writer for the two analytics record streams |
//!
//! ## Object flow
//!
//! ```text
//!  trace insert ──▶ DRAM (LRU) ── eviction, from_fifo == false ──▶ FIFO flash
//!                    ▲                                              │
//!                    └────────────── promotion on flash hit ────────┘
//!                                                                   │
//!                            segment clear on rotation ─────────────┴──▶ overwritten
//!                                                                        side-table
//! ```
//!
//! ## Example
//!
//! ```
//! use flashtier::config::{DramCacheConfig, FifoCacheConfig, TieredCacheConfig};
//! use flashtier::report::MemoryEvictionLog;
//! use flashtier::TieredCache;
//!
//! let config = TieredCacheConfig {
//!     dram: DramCacheConfig { capacity: 4096 },
//!     fifo: FifoCacheConfig { capacity: 1 << 20 },
//! };
//! let mut cache = TieredCache::new(config, Box::new(MemoryEvictionLog::new()))?;
//!
//! // Driver pattern: lookup, insert on miss.
//! if !cache.lookup("user:42")? {
//!     cache.insert("user:42", 512)?;
//! }
//! assert!(cache.lookup("user:42")?);
//! assert_eq!(cache.stat().num_hits, 1);
//! # Ok::<(), flashtier::Error>(())
//! ```

/// Entry types shared by the two tiers.
pub mod entry;

/// Doubly linked recency list backing the DRAM tier.
///
/// Internal infrastructure: exposes unsafe raw pointer operations that
/// require careful invariant maintenance. Use [`DramCache`] instead.
pub(crate) mod list;

/// Tier configuration structures.
pub mod config;

/// Error types.
pub mod error;

/// Size-aware LRU DRAM tier.
pub mod dram;

/// Segmented flash FIFO tier with rotation analytics.
pub mod fifo;

/// Analytics record streams and their writers.
pub mod report;

/// Cumulative simulation counters.
pub mod stat;

/// Two-tier coordinator.
pub mod tiered;

pub use dram::DramCache;
pub use entry::{DramEntry, FifoEntry};
pub use error::{Error, Result};
pub use fifo::FifoCache;
pub use stat::Stat;
pub use tiered::TieredCache;
