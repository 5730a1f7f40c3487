//! Trace replay loop.
//!
//! Wires the trace reader, the two-tier cache and the reporters together
//! and replays the workload one request at a time: DELETE records remove
//! the key from both tiers, GET records look the key up and insert it on a
//! miss.

use crate::stats::StatReporter;
use crate::trace::{TraceReader, MAX_GET_SIZE};
use flashtier::config::{DramCacheConfig, FifoCacheConfig, TieredCacheConfig};
use flashtier::report::FileEvictionLog;
use flashtier::{Stat, TieredCache};
use std::error::Error;
use std::path::PathBuf;
use tracing::info;

/// Everything a replay needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Trace files; replayed in sorted lexicographic order.
    pub files: Vec<PathBuf>,
    /// DRAM tier capacity in bytes.
    pub dram_size: u64,
    /// Flash FIFO tier capacity in bytes.
    pub fifo_size: u64,
    /// Periodic statistics CSV path.
    pub output: PathBuf,
    /// Overwritten record stream path.
    pub overwritten_log: PathBuf,
    /// Overwritten-accessed record stream path.
    pub overwritten_acc_log: PathBuf,
}

/// Replays the configured trace and returns the final counters.
///
/// All configuration problems (unopenable files, a DRAM tier smaller than
/// the largest admissible object, a flash tier smaller than one segment)
/// fail here, before the first request is processed.
pub fn run(config: &RunConfig) -> Result<Stat, Box<dyn Error>> {
    if config.dram_size < u64::from(MAX_GET_SIZE) {
        return Err(format!(
            "dram capacity {} B cannot hold the largest admissible object ({} B)",
            config.dram_size, MAX_GET_SIZE
        )
        .into());
    }

    let trace = TraceReader::open(&config.files)?;
    let log = FileEvictionLog::create(&config.overwritten_log, &config.overwritten_acc_log)?;
    let mut cache = TieredCache::new(
        TieredCacheConfig {
            dram: DramCacheConfig {
                capacity: config.dram_size,
            },
            fifo: FifoCacheConfig {
                capacity: config.fifo_size,
            },
        },
        Box::new(log),
    )?;
    let mut reporter = StatReporter::create(&config.output)?;

    for request in trace {
        reporter.maybe_report(&cache.stat())?;

        if !request.is_get {
            cache.remove(&request.key);
            continue;
        }
        if !cache.lookup(&request.key)? {
            cache.insert(&request.key, request.size)?;
        }
    }

    cache.flush()?;
    reporter.flush()?;

    let stat = cache.stat();
    info!(
        accesses = stat.num_accesses,
        hits = stat.num_hits,
        removed = stat.num_removed,
        overwritten_hits = stat.num_fifo_overwritten_hits,
        "trace replay finished, miss ratio {:.2}",
        stat.miss_ratio()
    );
    Ok(stat)
}
